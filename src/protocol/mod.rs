//! Protocol Module
//!
//! Defines the wire protocol spoken with the server.
//!
//! ## Request Format
//! ```text
//! ┌────────────────┬──────────────────────────────────────┐
//! │ *<argc>\r\n    │ $<len>\r\n<bytes>\r\n  × argc          │
//! └────────────────┴──────────────────────────────────────┘
//! ```
//!
//! ## Reply Tags
//! - `+` status line
//! - `-` error line
//! - `:` signed decimal integer
//! - `$` length-prefixed bulk (`-1` = null)
//! - `*` element-count-prefixed array (`-1` = null), elements nest

mod command;
mod reply;
mod codec;

pub use command::{format_f64, Command};
pub use reply::RawReply;
pub use codec::{
    decode_reply, decode_reply_with_limits, encode_command, encode_command_into, encode_reply,
    encode_reply_into, encoded_len, read_reply, write_reply, DecodeLimits,
    DEFAULT_MAX_ARRAY_LEN, DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH, MAX_LINE_LEN,
};
