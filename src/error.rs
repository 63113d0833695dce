//! Error types for Respline
//!
//! Provides a unified error type for all operations.
//!
//! ## Propagation
//! - `Network`, `Protocol`, `SyncState`: fatal for the whole in-flight batch,
//!   the connection is poisoned and must be recreated
//! - `Server`, `Conversion`: contained in the one Response that produced them
//! - `Transaction`, `Discarded`, `NotSynced`, `WatchAborted`: caller-visible
//!   state outcomes, the connection stays usable

use thiserror::Error;

/// Result type alias using ResplineError
pub type Result<T> = std::result::Result<T, ResplineError>;

/// Unified error type for Respline operations
///
/// `Clone` so one batch failure can be stored into every pending Response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResplineError {
    // -------------------------------------------------------------------------
    // Fatal Errors (poison the connection)
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Sync state error: {0}")]
    SyncState(String),

    // -------------------------------------------------------------------------
    // Per-Response Errors
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    #[error("Conversion error: expected {expected}, got {actual}")]
    Conversion { expected: String, actual: String },

    // -------------------------------------------------------------------------
    // Response / Transaction State
    // -------------------------------------------------------------------------
    #[error("Response not yet synced")]
    NotSynced,

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Transaction discarded")]
    Discarded,

    #[error("Transaction aborted by concurrent modification of a watched key")]
    WatchAborted,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResplineError {
    /// Build a conversion error from the expected and actual shape names
    pub fn conversion(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ResplineError::Conversion {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for the kinds that poison the connection
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResplineError::Network(_) | ResplineError::Protocol(_) | ResplineError::SyncState(_)
        )
    }

    /// True if the server answered this command with an error reply
    pub fn is_server_error(&self) -> bool {
        matches!(self, ResplineError::Server(_))
    }
}

impl From<std::io::Error> for ResplineError {
    fn from(err: std::io::Error) -> Self {
        ResplineError::Network(err.to_string())
    }
}
