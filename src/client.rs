//! Client
//!
//! Owns one connection and tracks whether it can still be trusted.
//!
//! ## Modes
//! - Immediate: `send` writes one command and reads its reply
//! - Deferred: `pipelined` returns a `Pipeline` borrowing the connection
//! - Transactional: `transaction` / `multi` return a `Transaction`
//!
//! Pipelines and transactions hold `&mut Client`, so at most one batch is
//! ever in flight on a connection.

use crate::config::Config;
use crate::convert;
use crate::error::{ResplineError, Result};
use crate::network::{Connection, TcpConnection};
use crate::pipeline::{Pipeline, Response, Transaction};
use crate::protocol::{Command, RawReply};

/// Health of the underlying connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionHealth {
    /// Usable
    Open,

    /// A fatal failure left the stream position unknown; never reuse
    Poisoned(ResplineError),

    /// Closed by the caller
    Closed,
}

/// Single-connection protocol client
pub struct Client<C: Connection> {
    conn: C,
    health: ConnectionHealth,
}

impl Client<TcpConnection> {
    /// Connect over TCP using `config`
    pub fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(TcpConnection::connect(config)?))
    }
}

impl<C: Connection> Client<C> {
    /// Wrap an established connection
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            health: ConnectionHealth::Open,
        }
    }

    // =========================================================================
    // Immediate Mode
    // =========================================================================

    /// Write one command and read its reply right away
    ///
    /// Errors before any byte is written if the connection is closed or
    /// poisoned; otherwise the outcome (including network failure) is in
    /// the returned Response.
    pub fn send(&mut self, command: &Command) -> Result<Response<RawReply>> {
        self.ensure_usable()?;
        let reply = self
            .write_batch(&command.encode())
            .and_then(|_| self.read_one());
        Ok(Response::settled(reply, convert::to_raw))
    }

    /// `send` and unwrap the reply
    pub fn execute(&mut self, command: &Command) -> Result<RawReply> {
        self.send(command)?.get()
    }

    /// `send` and convert the reply
    pub fn query<T, F>(&mut self, command: &Command, convert: F) -> Result<T>
    where
        F: FnOnce(Result<RawReply>) -> Result<T>,
    {
        convert(self.execute(command))
    }

    // =========================================================================
    // Deferred / Transactional Modes
    // =========================================================================

    /// Start a pipeline holding this connection until dropped
    pub fn pipelined(&mut self) -> Pipeline<'_, C> {
        Pipeline::new(self)
    }

    /// Start a transaction in the idle state (WATCH may follow)
    pub fn transaction(&mut self) -> Transaction<'_, C> {
        Transaction::new(self)
    }

    /// Start a transaction with MULTI already issued
    pub fn multi(&mut self) -> Result<Transaction<'_, C>> {
        let mut tx = Transaction::new(self);
        tx.begin()?;
        Ok(tx)
    }

    /// WATCH keys for the next transaction on this connection
    pub fn watch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<()> {
        let command = Command::new("WATCH").args(keys);
        self.query(&command, convert::to_status).map(|_| ())
    }

    /// Forget every watched key
    pub fn unwatch(&mut self) -> Result<()> {
        self.query(&Command::new("UNWATCH"), convert::to_status)
            .map(|_| ())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn health(&self) -> &ConnectionHealth {
        &self.health
    }

    pub fn is_poisoned(&self) -> bool {
        matches!(self.health, ConnectionHealth::Poisoned(_))
    }

    pub fn is_closed(&self) -> bool {
        self.health == ConnectionHealth::Closed || self.conn.is_closed()
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.health = ConnectionHealth::Closed;
        self.conn.close()
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Give back the underlying connection
    pub fn into_inner(self) -> C {
        self.conn
    }

    // =========================================================================
    // I/O used by Pipeline and Transaction
    // =========================================================================

    /// Fail fast, without I/O, when the connection can't be used
    pub(crate) fn ensure_usable(&self) -> Result<()> {
        match &self.health {
            ConnectionHealth::Poisoned(err) => Err(ResplineError::Network(format!(
                "connection poisoned by earlier failure: {}",
                err
            ))),
            ConnectionHealth::Closed => Err(ResplineError::Network("connection closed".to_string())),
            ConnectionHealth::Open if self.conn.is_closed() => {
                Err(ResplineError::Network("connection closed".to_string()))
            }
            ConnectionHealth::Open => Ok(()),
        }
    }

    pub(crate) fn write_batch(&mut self, bytes: &[u8]) -> Result<()> {
        self.conn.write(bytes).map_err(|err| self.poison(err))
    }

    pub(crate) fn read_one(&mut self) -> Result<RawReply> {
        self.conn.read_reply().map_err(|err| self.poison(err))
    }

    /// Mark the connection unusable; returns `err` for chaining
    pub(crate) fn poison(&mut self, err: ResplineError) -> ResplineError {
        if self.health == ConnectionHealth::Open {
            tracing::warn!("Connection poisoned: {}", err);
            self.health = ConnectionHealth::Poisoned(err.clone());
        }
        err
    }
}
