//! Transaction Coordinator
//!
//! MULTI / EXEC / DISCARD / WATCH on top of the batch queue.
//!
//! ## State Machine
//! ```text
//! Idle ──begin──► Began ──enqueue──► Queuing ──enqueue──┐
//!  │ watch          │                   │ ◄─────────────┘
//!  └──(Idle)        ├──exec────────────►├──exec──► Executed
//!                   └──discard─────────►└──discard──► Discarded
//! ```
//!
//! MULTI is buffered, not sent, so the whole transaction costs one round
//! trip at `exec`:
//! ```text
//! write:  MULTI  cmd1 .. cmdN  EXEC
//! read:   +OK    +QUEUED × N   *N (or *-1 when a watched key changed)
//! ```

use crate::client::Client;
use crate::convert::{self, ReplyShape, TypedReply};
use crate::error::{ResplineError, Result};
use crate::network::Connection;
use crate::protocol::{Command, RawReply};

use super::queue::Batch;
use super::response::Response;

/// Where a transaction is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Began,
    Queuing,
    Executed,
    Discarded,
}

/// A MULTI/EXEC block bound to one client
pub struct Transaction<'a, C: Connection> {
    client: &'a mut Client<C>,
    state: TransactionState,
    batch: Batch,
    watched: usize,
}

impl<'a, C: Connection> Transaction<'a, C> {
    pub(crate) fn new(client: &'a mut Client<C>) -> Self {
        Self {
            client,
            state: TransactionState::Idle,
            batch: Batch::new(),
            watched: 0,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Commands queued since MULTI
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.len() == 0
    }

    /// Number of keys watched through this transaction
    pub fn watched(&self) -> usize {
        self.watched
    }

    // =========================================================================
    // Optimistic Locking
    // =========================================================================

    /// WATCH keys; only legal before `begin`
    ///
    /// Sent immediately so values read after this call are guarded. If any
    /// watched key changes before `exec`, `exec` returns
    /// `ResplineError::WatchAborted`.
    pub fn watch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<()> {
        if self.state != TransactionState::Idle {
            return Err(self.illegal("WATCH"));
        }
        self.client.watch(keys)?;
        self.watched += keys.len();
        Ok(())
    }

    /// UNWATCH every key; only legal before `begin`
    pub fn unwatch(&mut self) -> Result<()> {
        if self.state != TransactionState::Idle {
            return Err(self.illegal("UNWATCH"));
        }
        self.client.unwatch()?;
        self.watched = 0;
        Ok(())
    }

    // =========================================================================
    // MULTI / queue
    // =========================================================================

    /// Open the MULTI block
    pub fn begin(&mut self) -> Result<()> {
        if self.state != TransactionState::Idle {
            return Err(self.illegal("MULTI"));
        }
        self.client.ensure_usable()?;
        self.batch.push_control(&Command::new("MULTI"));
        self.state = TransactionState::Began;
        Ok(())
    }

    /// Queue a command; its Response yields the raw reply after `exec`
    pub fn enqueue(&mut self, command: &Command) -> Result<Response<RawReply>> {
        self.enqueue_as(command, convert::to_raw)
    }

    /// Queue a command with the conversion to apply to its EXEC element
    pub fn enqueue_as<T, F>(&mut self, command: &Command, convert: F) -> Result<Response<T>>
    where
        T: Send + 'static,
        F: FnOnce(Result<RawReply>) -> Result<T> + Send + 'static,
    {
        if !self.is_open() {
            return Err(self.illegal("command queueing"));
        }
        self.client.ensure_usable()?;
        let response = self.batch.push(command, convert);
        self.state = TransactionState::Queuing;
        Ok(response)
    }

    /// Queue a command, converting by the shape registered for its name
    pub fn enqueue_typed(&mut self, command: &Command) -> Result<Response<TypedReply>> {
        let shape = ReplyShape::for_command(command);
        self.enqueue_as(command, move |reply| shape.convert(reply))
    }

    // =========================================================================
    // EXEC / DISCARD
    // =========================================================================

    /// Send MULTI, the queued commands and EXEC in one write and settle every
    /// queued Response from EXEC's array
    ///
    /// Returns `WatchAborted` when EXEC answers with a null array, and
    /// `Server` when the server refused the block (EXECABORT); in both cases
    /// every member Response carries the error instead of a value.
    pub fn exec(&mut self) -> Result<()> {
        self.exec_collect().map(|_| ())
    }

    /// Like `exec`, also returning a raw Response per member in issue order
    pub fn exec_responses(&mut self) -> Result<Vec<Response<RawReply>>> {
        let outcomes = self.exec_collect()?;
        Ok(outcomes
            .into_iter()
            .map(|outcome| Response::settled(outcome, convert::to_raw))
            .collect())
    }

    /// Drop the queued commands and settle their Responses as discarded
    ///
    /// Nothing has been sent before `exec`, so this touches no I/O.
    pub fn discard(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(self.illegal("DISCARD"));
        }
        tracing::debug!("Discarding transaction with {} queued commands", self.batch.len());
        self.batch.fail_all(&ResplineError::Discarded);
        self.state = TransactionState::Discarded;
        Ok(())
    }

    fn exec_collect(&mut self) -> Result<Vec<Result<RawReply>>> {
        if !self.is_open() {
            return Err(self.illegal("EXEC"));
        }
        self.state = TransactionState::Executed;

        if let Err(err) = self.client.ensure_usable() {
            self.batch.fail_all(&err);
            return Err(err);
        }

        self.batch.push_control(&Command::new("EXEC"));
        let (bytes, resolvers) = self.batch.take();
        let queued = resolvers.len();
        tracing::debug!("EXEC: {} queued commands, {} bytes", queued, bytes.len());

        let outcomes = match self.round_trip(&bytes, queued) {
            Ok(outcomes) => outcomes,
            Err(err) => {
                if err.is_fatal() {
                    tracing::warn!("Transaction failed: {}", err);
                    self.client.poison(err.clone());
                }
                for resolver in resolvers {
                    resolver.fail(err.clone());
                }
                return Err(err);
            }
        };

        let block_error = outcomes.block_error.clone();
        let members: Vec<Result<RawReply>> = outcomes.members;
        for (resolver, outcome) in resolvers.into_iter().zip(members.iter()) {
            resolver.resolve(outcome.clone());
        }

        match block_error {
            Some(err) => Err(err),
            None => Ok(members),
        }
    }

    /// Write the block, read `1 + queued + 1` replies and line them up
    /// with the members
    fn round_trip(&mut self, bytes: &[u8], queued: usize) -> Result<ExecOutcome> {
        self.client.write_batch(bytes)?;

        let multi = self.client.read_one()?;
        if !matches!(&multi, RawReply::Status(s) if s.eq_ignore_ascii_case("OK")) {
            return Err(ResplineError::SyncState(format!(
                "MULTI answered with {} instead of OK",
                multi.kind()
            )));
        }

        // A member refused at queue time carries its own error
        let mut queue_errors: Vec<Option<ResplineError>> = Vec::with_capacity(queued);
        for i in 0..queued {
            match self.client.read_one()? {
                RawReply::Status(s) if s.eq_ignore_ascii_case("QUEUED") => queue_errors.push(None),
                RawReply::ServerError(msg) => queue_errors.push(Some(ResplineError::Server(msg))),
                other => {
                    return Err(ResplineError::SyncState(format!(
                        "command {} acknowledged with {} instead of QUEUED",
                        i,
                        other.kind()
                    )))
                }
            }
        }

        match self.client.read_one()? {
            RawReply::Array(None) => {
                tracing::debug!("EXEC aborted: watched key modified");
                Ok(ExecOutcome::block_failed(queued, ResplineError::WatchAborted, queue_errors))
            }
            RawReply::ServerError(msg) => Ok(ExecOutcome::block_failed(
                queued,
                ResplineError::Server(msg),
                queue_errors,
            )),
            RawReply::Array(Some(items)) if items.len() == queued => Ok(ExecOutcome {
                members: items.into_iter().map(Ok).collect(),
                block_error: None,
            }),
            RawReply::Array(Some(items)) => Err(ResplineError::SyncState(format!(
                "EXEC returned {} elements for {} queued commands",
                items.len(),
                queued
            ))),
            other => Err(ResplineError::SyncState(format!(
                "EXEC answered with {} instead of an array",
                other.kind()
            ))),
        }
    }

    fn is_open(&self) -> bool {
        matches!(self.state, TransactionState::Began | TransactionState::Queuing)
    }

    fn illegal(&self, what: &str) -> ResplineError {
        ResplineError::Transaction(format!("{} not allowed in state {:?}", what, self.state))
    }
}

impl<'a, C: Connection> Drop for Transaction<'a, C> {
    /// An abandoned open transaction leaves no Response pending
    fn drop(&mut self) {
        if self.is_open() {
            self.batch.fail_all(&ResplineError::Discarded);
        }
    }
}

/// Per-member outcomes of one EXEC round trip
struct ExecOutcome {
    members: Vec<Result<RawReply>>,
    block_error: Option<ResplineError>,
}

impl ExecOutcome {
    /// The block as a whole failed; members refused at queue time keep
    /// their own error, the rest get `err`
    fn block_failed(queued: usize, err: ResplineError, queue_errors: Vec<Option<ResplineError>>) -> Self {
        let members = queue_errors
            .into_iter()
            .chain(std::iter::repeat(None))
            .take(queued)
            .map(|own| Err(own.unwrap_or_else(|| err.clone())))
            .collect();
        Self {
            members,
            block_error: Some(err),
        }
    }
}
