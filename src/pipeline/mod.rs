//! Pipeline Module
//!
//! Deferred execution of commands over one connection.
//!
//! ## Responsibilities
//! - Hand out a `Response` per queued command without doing I/O
//! - Flush a whole batch in one write, read the replies back in FIFO order
//! - Layer MULTI/EXEC/DISCARD/WATCH on the same batch machinery
//!
//! ## Ordering
//! The server answers commands on one connection strictly in arrival order,
//! so the i-th reply read always belongs to the i-th command written.

mod response;
mod queue;
mod transaction;

pub use response::{Response, ResponseState};
pub use queue::Pipeline;
pub use transaction::{Transaction, TransactionState};
