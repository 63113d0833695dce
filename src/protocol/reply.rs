//! Reply definitions
//!
//! `RawReply` is the decoded shape of one server reply. Nothing above the
//! decoder holds raw wire bytes; every conversion starts from this tree.

use std::fmt;

use bytes::Bytes;

use crate::error::{ResplineError, Result};

/// One decoded reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReply {
    /// `+<text>\r\n`
    Status(String),

    /// `-<text>\r\n`
    ServerError(String),

    /// `:<i64>\r\n`
    Integer(i64),

    /// `$<len>\r\n<bytes>\r\n`, `None` for `$-1\r\n`
    Bulk(Option<Bytes>),

    /// `*<count>\r\n<replies...>`, `None` for `*-1\r\n`
    Array(Option<Vec<RawReply>>),
}

impl RawReply {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn status(text: impl Into<String>) -> Self {
        RawReply::Status(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        RawReply::ServerError(text.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RawReply::Bulk(Some(data.into()))
    }

    pub fn null_bulk() -> Self {
        RawReply::Bulk(None)
    }

    pub fn array(items: Vec<RawReply>) -> Self {
        RawReply::Array(Some(items))
    }

    pub fn null_array() -> Self {
        RawReply::Array(None)
    }

    // =========================================================================
    // Shape Inspection
    // =========================================================================

    /// Short name of this reply's shape, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            RawReply::Status(_) => "status",
            RawReply::ServerError(_) => "error",
            RawReply::Integer(_) => "integer",
            RawReply::Bulk(Some(_)) => "bulk",
            RawReply::Bulk(None) => "null bulk",
            RawReply::Array(Some(_)) => "array",
            RawReply::Array(None) => "null array",
        }
    }

    /// True for a null bulk or a null array
    pub fn is_null(&self) -> bool {
        matches!(self, RawReply::Bulk(None) | RawReply::Array(None))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RawReply::ServerError(_))
    }

    // =========================================================================
    // Fail-closed Accessors
    // =========================================================================

    /// Lift a server error reply into `ResplineError::Server`
    pub fn into_result(self) -> Result<RawReply> {
        match self {
            RawReply::ServerError(msg) => Err(ResplineError::Server(msg)),
            other => Ok(other),
        }
    }

    /// Text payload of a status or non-null bulk reply
    pub fn as_text(&self) -> Result<&[u8]> {
        match self {
            RawReply::Status(s) => Ok(s.as_bytes()),
            RawReply::Bulk(Some(b)) => Ok(b),
            other => Err(ResplineError::conversion("status or bulk", other.kind())),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            RawReply::Integer(n) => Ok(*n),
            other => Err(ResplineError::conversion("integer", other.kind())),
        }
    }

    pub fn as_array(&self) -> Result<&[RawReply]> {
        match self {
            RawReply::Array(Some(items)) => Ok(items),
            other => Err(ResplineError::conversion("array", other.kind())),
        }
    }

    pub fn into_array(self) -> Result<Vec<RawReply>> {
        match self {
            RawReply::Array(Some(items)) => Ok(items),
            other => Err(ResplineError::conversion("array", other.kind())),
        }
    }
}

/// Renders replies the way an interactive CLI prints them
impl fmt::Display for RawReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_reply(f, self, 0)
    }
}

fn write_reply(f: &mut fmt::Formatter<'_>, reply: &RawReply, indent: usize) -> fmt::Result {
    match reply {
        RawReply::Status(s) => write!(f, "{}", s),
        RawReply::ServerError(s) => write!(f, "(error) {}", s),
        RawReply::Integer(n) => write!(f, "(integer) {}", n),
        RawReply::Bulk(Some(b)) => write!(f, "{:?}", String::from_utf8_lossy(b)),
        RawReply::Bulk(None) | RawReply::Array(None) => write!(f, "(nil)"),
        RawReply::Array(Some(items)) if items.is_empty() => write!(f, "(empty array)"),
        RawReply::Array(Some(items)) => {
            let width = items.len().to_string().len();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                    write!(f, "{:indent$}", "", indent = indent)?;
                }
                write!(f, "{:>width$}) ", i + 1, width = width)?;
                write_reply(f, item, indent + width + 2)?;
            }
            Ok(())
        }
    }
}
