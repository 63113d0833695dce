//! Connection Transport
//!
//! The duplex byte stream the protocol engine runs over.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream};

use crate::config::Config;
use crate::error::{ResplineError, Result};
use crate::protocol::{read_reply, DecodeLimits, RawReply};

/// A duplex stream carrying requests out and replies back
///
/// Single-writer / single-reader: one pipeline or transaction owns it at a
/// time. Timeouts and reconnects belong to the implementation, not the core.
pub trait Connection {
    /// Write all bytes and flush them in one go
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Block until one complete reply has been decoded
    fn read_reply(&mut self) -> Result<RawReply>;

    /// Close the stream; further I/O fails with a network error
    fn close(&mut self) -> Result<()>;

    /// True once the stream is known to be closed
    fn is_closed(&self) -> bool;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_reply(&mut self) -> Result<RawReply> {
        (**self).read_reply()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Blocking TCP connection
pub struct TcpConnection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Decoder bounds
    limits: DecodeLimits,

    /// Peer address for logging
    peer_addr: String,

    closed: bool,
}

impl TcpConnection {
    /// Connect using the address, timeouts and limits in `config`
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = config.socket_addr()?;
        let stream = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let conn = Self::from_stream(stream, config.limits)?;
        tracing::debug!("Connected to {}", conn.peer_addr);
        Ok(conn)
    }

    /// Wrap an already-connected stream
    pub fn from_stream(stream: TcpStream, limits: DecodeLimits) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            limits,
            peer_addr,
            closed: false,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ResplineError::Network(format!(
                "connection to {} is closed",
                self.peer_addr
            )));
        }
        Ok(())
    }
}

impl Connection for TcpConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        tracing::trace!("Wrote {} bytes to {}", bytes.len(), self.peer_addr);
        Ok(())
    }

    fn read_reply(&mut self) -> Result<RawReply> {
        self.ensure_open()?;
        read_reply(&mut self.reader, &self.limits)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best effort: push out anything still buffered
        if let Err(e) = self.writer.flush() {
            tracing::debug!("Flush on close to {} failed: {}", self.peer_addr, e);
        }
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!("Closed connection to {}", self.peer_addr);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
