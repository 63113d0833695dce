//! One-connection fake server
//!
//! Accepts a single client, then for each step reads an exact number of
//! request bytes, reports them on a channel and answers with canned bytes.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver};
use respline::Command;

pub struct Step {
    pub expect: usize,
    pub reply: Vec<u8>,
}

impl Step {
    /// Expect `commands` in one go, answer with `reply`
    pub fn new(commands: &[Command], reply: &[u8]) -> Self {
        Self {
            expect: commands.iter().map(|c| c.encode().len()).sum(),
            reply: reply.to_vec(),
        }
    }
}

pub struct FakeServer {
    pub addr: SocketAddr,
    pub requests: Receiver<Vec<u8>>,
    handle: JoinHandle<()>,
}

impl FakeServer {
    pub fn start(steps: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = unbounded();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for step in steps {
                let mut request = vec![0u8; step.expect];
                if stream.read_exact(&mut request).is_err() {
                    return;
                }
                let _ = tx.send(request);
                if stream.write_all(&step.reply).is_err() {
                    return;
                }
            }
            // Dropping the stream closes the connection
        });

        Self {
            addr,
            requests: rx,
            handle,
        }
    }

    pub fn join(self) {
        self.handle.join().unwrap();
    }
}
