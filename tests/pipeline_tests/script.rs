//! Scripted in-memory connection
//!
//! Replays canned reply bytes and records everything written to it.

use std::io::{BufReader, Cursor};

use respline::protocol::{read_reply, DecodeLimits, RawReply};
use respline::{Client, Command, Connection, ResplineError, Result};

pub struct ScriptedConnection {
    replies: BufReader<Cursor<Vec<u8>>>,
    pub written: Vec<u8>,
    pub writes: usize,
    pub reads: usize,
    pub fail_writes: bool,
    closed: bool,
}

impl ScriptedConnection {
    pub fn new(replies: &[u8]) -> Self {
        Self {
            replies: BufReader::new(Cursor::new(replies.to_vec())),
            written: Vec::new(),
            writes: 0,
            reads: 0,
            fail_writes: false,
            closed: false,
        }
    }

    pub fn failing_writes() -> Self {
        let mut conn = Self::new(b"");
        conn.fail_writes = true;
        conn
    }
}

impl Connection for ScriptedConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ResplineError::Network("closed".to_string()));
        }
        if self.fail_writes {
            return Err(ResplineError::Network("broken pipe".to_string()));
        }
        self.writes += 1;
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn read_reply(&mut self) -> Result<RawReply> {
        if self.closed {
            return Err(ResplineError::Network("closed".to_string()));
        }
        self.reads += 1;
        read_reply(&mut self.replies, &DecodeLimits::default())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// A client whose server will answer with exactly `replies`
pub fn client(replies: &[u8]) -> Client<ScriptedConnection> {
    Client::new(ScriptedConnection::new(replies))
}

/// Concatenated request bytes for `commands`
pub fn encoded(commands: &[Command]) -> Vec<u8> {
    commands.iter().flat_map(|c| c.encode()).collect()
}

pub fn cmd(line: &str) -> Command {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    Command::new(name).args(words)
}
