//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg bytes>\r\n     (repeated argc times)
//! ```
//!
//! ### Replies
//! ```text
//! +<status>\r\n
//! -<error>\r\n
//! :<i64>\r\n
//! $<len>\r\n<bytes>\r\n         $-1\r\n  = null bulk
//! *<count>\r\n<reply>...        *-1\r\n  = null array
//! ```

use std::io::{self, BufRead, Cursor, Read, Write};

use bytes::Bytes;

use crate::error::{ResplineError, Result};
use super::RawReply;

const CRLF: &[u8; 2] = b"\r\n";

/// Longest header or status line accepted (64 KiB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Default maximum bulk payload (512 MiB, the server's own ceiling)
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum declared array element count
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1 << 20;

/// Default maximum array nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Bounds applied to wire-declared lengths before anything is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum bulk payload in bytes
    pub max_bulk_len: usize,

    /// Maximum element count of a single array
    pub max_array_len: usize,

    /// Maximum nesting depth of arrays
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a name-plus-arguments list to request bytes
///
/// Arguments are opaque byte strings; nothing is escaped.
pub fn encode_command<A: AsRef<[u8]>>(args: &[A]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(args));
    encode_command_into(&mut buf, args);
    buf
}

/// Append the encoding of one request to `buf`
pub fn encode_command_into<A: AsRef<[u8]>>(buf: &mut Vec<u8>, args: &[A]) {
    let mut num = itoa::Buffer::new();

    buf.push(b'*');
    buf.extend_from_slice(num.format(args.len()).as_bytes());
    buf.extend_from_slice(CRLF);

    for arg in args {
        let arg = arg.as_ref();
        buf.push(b'$');
        buf.extend_from_slice(num.format(arg.len()).as_bytes());
        buf.extend_from_slice(CRLF);
        buf.extend_from_slice(arg);
        buf.extend_from_slice(CRLF);
    }
}

/// Exact encoded size of a request
pub fn encoded_len<A: AsRef<[u8]>>(args: &[A]) -> usize {
    let mut num = itoa::Buffer::new();
    let mut len = 1 + num.format(args.len()).len() + 2;
    for arg in args {
        let arg_len = arg.as_ref().len();
        len += 1 + num.format(arg_len).len() + 2 + arg_len + 2;
    }
    len
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Encode a reply to wire bytes (the server side of the exchange)
pub fn encode_reply(reply: &RawReply) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_reply_into(&mut buf, reply);
    buf
}

/// Append the encoding of one reply to `buf`
pub fn encode_reply_into(buf: &mut Vec<u8>, reply: &RawReply) {
    let mut num = itoa::Buffer::new();
    match reply {
        RawReply::Status(s) => {
            buf.push(b'+');
            buf.extend_from_slice(s.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        RawReply::ServerError(s) => {
            buf.push(b'-');
            buf.extend_from_slice(s.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        RawReply::Integer(n) => {
            buf.push(b':');
            buf.extend_from_slice(num.format(*n).as_bytes());
            buf.extend_from_slice(CRLF);
        }
        RawReply::Bulk(None) => buf.extend_from_slice(b"$-1\r\n"),
        RawReply::Bulk(Some(data)) => {
            buf.push(b'$');
            buf.extend_from_slice(num.format(data.len()).as_bytes());
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(data);
            buf.extend_from_slice(CRLF);
        }
        RawReply::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
        RawReply::Array(Some(items)) => {
            buf.push(b'*');
            buf.extend_from_slice(num.format(items.len()).as_bytes());
            buf.extend_from_slice(CRLF);
            for item in items {
                encode_reply_into(buf, item);
            }
        }
    }
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode one reply from the front of `bytes` with default limits
///
/// Returns the reply and number of bytes consumed.
pub fn decode_reply(bytes: &[u8]) -> Result<(RawReply, usize)> {
    decode_reply_with_limits(bytes, &DecodeLimits::default())
}

/// Decode one reply from the front of `bytes`
pub fn decode_reply_with_limits(bytes: &[u8], limits: &DecodeLimits) -> Result<(RawReply, usize)> {
    if bytes.is_empty() {
        return Err(ResplineError::Protocol("Incomplete reply: no bytes".to_string()));
    }
    let mut cursor = Cursor::new(bytes);
    let reply = read_reply(&mut cursor, limits)?;
    Ok((reply, cursor.position() as usize))
}

/// Read a complete reply from a stream
///
/// Blocks until one reply has been consumed, leaving the reader positioned
/// at the next reply. End of stream before the first byte is a network
/// error (peer closed); end of stream inside a reply is a protocol error.
pub fn read_reply<R: BufRead>(reader: &mut R, limits: &DecodeLimits) -> Result<RawReply> {
    let tag = loop {
        let mut tag = [0u8; 1];
        match reader.read(&mut tag) {
            Ok(0) => return Err(ResplineError::Network("connection closed by peer".to_string())),
            Ok(_) => break tag[0],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    read_reply_body(reader, tag, limits, 0)
}

fn read_reply_body<R: BufRead>(
    reader: &mut R,
    tag: u8,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<RawReply> {
    match tag {
        b'+' => Ok(RawReply::Status(read_text_line(reader)?)),
        b'-' => Ok(RawReply::ServerError(read_text_line(reader)?)),
        b':' => Ok(RawReply::Integer(read_int_line(reader)?)),
        b'$' => {
            let len = read_int_line(reader)?;
            let len = match declared_len(len, "bulk")? {
                None => return Ok(RawReply::Bulk(None)),
                Some(len) => len,
            };
            if len > limits.max_bulk_len {
                return Err(ResplineError::Protocol(format!(
                    "Bulk too large: {} bytes (max {})",
                    len, limits.max_bulk_len
                )));
            }

            // Payload plus trailing CRLF; the buffer grows only as bytes arrive
            let mut data = Vec::new();
            reader
                .by_ref()
                .take(len as u64 + 2)
                .read_to_end(&mut data)
                .map_err(frame_io_error)?;
            if data.len() < len + 2 {
                return Err(ResplineError::Protocol(
                    "Truncated reply: stream ended mid-frame".to_string(),
                ));
            }
            if &data[len..] != CRLF {
                return Err(ResplineError::Protocol(
                    "Bulk payload not terminated by CRLF".to_string(),
                ));
            }
            data.truncate(len);
            Ok(RawReply::Bulk(Some(Bytes::from(data))))
        }
        b'*' => {
            let count = read_int_line(reader)?;
            let count = match declared_len(count, "array")? {
                None => return Ok(RawReply::Array(None)),
                Some(count) => count,
            };
            if count > limits.max_array_len {
                return Err(ResplineError::Protocol(format!(
                    "Array too large: {} elements (max {})",
                    count, limits.max_array_len
                )));
            }
            if depth >= limits.max_depth {
                return Err(ResplineError::Protocol(format!(
                    "Array nesting deeper than {}",
                    limits.max_depth
                )));
            }

            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let mut tag = [0u8; 1];
                reader.read_exact(&mut tag).map_err(frame_io_error)?;
                items.push(read_reply_body(reader, tag[0], limits, depth + 1)?);
            }
            Ok(RawReply::Array(Some(items)))
        }
        _ => Err(ResplineError::Protocol(format!(
            "Unknown reply tag: 0x{:02x}",
            tag
        ))),
    }
}

/// `-1` means null; anything below is malformed
fn declared_len(len: i64, what: &str) -> Result<Option<usize>> {
    match len {
        -1 => Ok(None),
        n if n < -1 => Err(ResplineError::Protocol(format!(
            "Invalid {} length: {}",
            what, n
        ))),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| ResplineError::Protocol(format!("Invalid {} length: {}", what, n))),
    }
}

/// Read up to and including CRLF, returning the line without it
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)
        .map_err(frame_io_error)?;

    if !line.ends_with(CRLF) {
        return Err(if line.len() >= MAX_LINE_LEN {
            ResplineError::Protocol(format!("Line longer than {} bytes", MAX_LINE_LEN))
        } else if line.ends_with(b"\n") {
            ResplineError::Protocol("Line terminated by bare LF".to_string())
        } else {
            ResplineError::Protocol("Truncated line: stream ended before CRLF".to_string())
        });
    }
    line.truncate(line.len() - 2);
    Ok(line)
}

fn read_text_line<R: BufRead>(reader: &mut R) -> Result<String> {
    String::from_utf8(read_line(reader)?)
        .map_err(|_| ResplineError::Protocol("Line is not valid UTF-8".to_string()))
}

fn read_int_line<R: BufRead>(reader: &mut R) -> Result<i64> {
    let line = read_line(reader)?;
    std::str::from_utf8(&line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ResplineError::Protocol(format!(
                "Invalid integer: {:?}",
                String::from_utf8_lossy(&line)
            ))
        })
}

/// I/O failures after a reply has started: the frame is cut short
fn frame_io_error(err: io::Error) -> ResplineError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ResplineError::Protocol("Truncated reply: stream ended mid-frame".to_string())
    } else {
        ResplineError::Network(err.to_string())
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &RawReply) -> Result<()> {
    writer.write_all(&encode_reply(reply))?;
    writer.flush()?;
    Ok(())
}
