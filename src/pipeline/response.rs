//! Response Future
//!
//! A typed placeholder for one reply that has not been read yet.
//!
//! ## States
//! ```text
//! Pending ──(Sync / Exec / send)──► Resolved(T)
//!    │
//!    └──────────────────────────────► Errored(ResplineError)
//! ```
//!
//! Exactly one writer moves a Response out of `Pending`: the `Resolver`
//! handed to the queue alongside it, consumed on use. Reads take the same
//! lock the write released, so every read after Sync returns observes the
//! resolved value.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ResplineError, Result};
use crate::protocol::RawReply;

/// Observable state of a Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Pending,
    Resolved,
    Errored,
}

enum Slot<T> {
    Pending,
    Resolved(T),
    Errored(ResplineError),
}

/// Handle to one command's eventual converted reply
pub struct Response<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Response<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("state", &self.state())
            .finish()
    }
}

impl<T> Response<T> {
    /// Current state, without blocking
    pub fn state(&self) -> ResponseState {
        match *self.slot.lock() {
            Slot::Pending => ResponseState::Pending,
            Slot::Resolved(_) => ResponseState::Resolved,
            Slot::Errored(_) => ResponseState::Errored,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == ResponseState::Pending
    }
}

impl<T: Clone> Response<T> {
    /// The converted value, or the error this command ended with
    ///
    /// Returns `ResplineError::NotSynced` while still pending; never blocks.
    pub fn get(&self) -> Result<T> {
        match &*self.slot.lock() {
            Slot::Pending => Err(ResplineError::NotSynced),
            Slot::Resolved(value) => Ok(value.clone()),
            Slot::Errored(err) => Err(err.clone()),
        }
    }
}

impl<T: Send + 'static> Response<T> {
    /// A pending Response plus the single Resolver allowed to settle it
    ///
    /// Server error replies reach `convert` already lifted into
    /// `ResplineError::Server`.
    pub(crate) fn pending<F>(convert: F) -> (Self, Resolver)
    where
        F: FnOnce(Result<RawReply>) -> Result<T> + Send + 'static,
    {
        let response = Self {
            slot: Arc::new(Mutex::new(Slot::Pending)),
        };
        let slot = Arc::clone(&response.slot);
        let resolver = Resolver {
            apply: Box::new(move |reply| {
                let result = convert(reply.and_then(RawReply::into_result));
                let mut slot = slot.lock();
                debug_assert!(matches!(*slot, Slot::Pending), "response resolved twice");
                *slot = match result {
                    Ok(value) => Slot::Resolved(value),
                    Err(err) => Slot::Errored(err),
                };
            }),
        };
        (response, resolver)
    }

    /// An already-settled Response
    pub(crate) fn settled(reply: Result<RawReply>, convert: impl FnOnce(Result<RawReply>) -> Result<T> + Send + 'static) -> Self {
        let (response, resolver) = Self::pending(convert);
        resolver.resolve(reply);
        response
    }
}

/// The write side of a Response
pub(crate) struct Resolver {
    apply: Box<dyn FnOnce(Result<RawReply>) + Send>,
}

impl Resolver {
    /// Convert `reply` and store the outcome
    pub(crate) fn resolve(self, reply: Result<RawReply>) {
        (self.apply)(reply)
    }

    /// Settle with an error that never reached the conversion step
    pub(crate) fn fail(self, err: ResplineError) {
        (self.apply)(Err(err))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}
