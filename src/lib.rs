//! # Respline
//!
//! A client-side engine for a line-oriented key-value wire protocol:
//! - Request encoding and reply decoding, byte-exact in both directions
//! - Deferred execution: pipelines flushed in one write, replies matched FIFO
//! - Optimistic transactions (WATCH / MULTI / EXEC / DISCARD)
//! - Declarative conversion of raw replies into typed values
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │          (immediate / pipelined / transactional)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               Pipeline / Transaction                         │
//! │        (FIFO batch, Response handles, state machine)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │   Convert   │
//!   │   (codec)   │          │  (shapes)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ Connection  │
//!   │   (TCP)     │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod pipeline;
pub mod convert;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ResplineError, Result};
pub use config::Config;
pub use client::{Client, ConnectionHealth};
pub use network::{Connection, TcpConnection};
pub use pipeline::{Pipeline, Response, ResponseState, Transaction, TransactionState};
pub use protocol::{Command, RawReply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Respline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
