//! Respline CLI Client
//!
//! Sends commands to a server in immediate, pipelined or transactional mode
//! and prints the replies.

use clap::{Parser, Subcommand};
use respline::{Client, Command, Config, RawReply, Response, TcpConnection};
use tracing_subscriber::{fmt, EnvFilter};

/// Respline CLI
#[derive(Parser, Debug)]
#[command(name = "respline-cli")]
#[command(about = "Command-line client for line-protocol key-value servers")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Connect timeout in milliseconds (0 = OS default)
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one command and print its reply
    Exec {
        /// Command name followed by its arguments
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },

    /// Send several commands in one batch
    Pipeline {
        /// Commands, each a whitespace-separated string ("SET k v")
        #[arg(required = true, num_args = 1..)]
        commands: Vec<String>,
    },

    /// Run several commands inside MULTI / EXEC
    Multi {
        /// Commands, each a whitespace-separated string ("INCR counter")
        #[arg(required = true, num_args = 1..)]
        commands: Vec<String>,

        /// Keys to WATCH before the block
        #[arg(short, long)]
        watch: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respline=debug"));

    // Replies go to stdout, logs to stderr
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addr(&args.server)
        .connect_timeout_ms(args.connect_timeout_ms)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    let mut client = match Client::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Exec { args } => run_exec(&mut client, &args),
        Commands::Pipeline { commands } => run_pipeline(&mut client, &commands),
        Commands::Multi { commands, watch } => run_multi(&mut client, &commands, &watch),
    };

    if let Err(e) = client.close() {
        tracing::debug!("Close failed: {}", e);
    }

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("(error) {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the server answered with an error reply
fn run_exec(client: &mut Client<TcpConnection>, args: &[String]) -> respline::Result<bool> {
    let command = Command::new(&args[0]).args(&args[1..]);
    let response = client.send(&command)?;
    Ok(print_response(None, &response))
}

fn run_pipeline(client: &mut Client<TcpConnection>, lines: &[String]) -> respline::Result<bool> {
    let commands = parse_lines(lines)?;
    let mut pipeline = client.pipelined();
    let responses = commands
        .iter()
        .map(|command| pipeline.enqueue(command))
        .collect::<respline::Result<Vec<_>>>()?;
    pipeline.sync()?;

    Ok(print_all(&responses))
}

fn run_multi(
    client: &mut Client<TcpConnection>,
    lines: &[String],
    watch: &[String],
) -> respline::Result<bool> {
    let commands = parse_lines(lines)?;
    let mut tx = client.transaction();
    if !watch.is_empty() {
        tx.watch(watch)?;
    }
    tx.begin()?;
    let responses = commands
        .iter()
        .map(|command| tx.enqueue(command))
        .collect::<respline::Result<Vec<_>>>()?;
    tx.exec()?;

    Ok(print_all(&responses))
}

fn parse_lines(lines: &[String]) -> respline::Result<Vec<Command>> {
    lines
        .iter()
        .map(|line| {
            let mut words = line.split_whitespace();
            let name = words
                .next()
                .ok_or_else(|| respline::ResplineError::Config("empty command".to_string()))?;
            Ok(Command::new(name).args(words))
        })
        .collect()
}

fn print_all(responses: &[Response<RawReply>]) -> bool {
    let mut ok = true;
    for (i, response) in responses.iter().enumerate() {
        ok &= print_response(Some(i + 1), response);
    }
    ok
}

fn print_response(index: Option<usize>, response: &Response<RawReply>) -> bool {
    let prefix = index.map(|i| format!("[{}] ", i)).unwrap_or_default();
    match response.get() {
        Ok(reply) => {
            println!("{}{}", prefix, reply);
            true
        }
        Err(e) => {
            println!("{}(error) {}", prefix, e);
            false
        }
    }
}
