//! Incremental RESP Request Decoder
//!
//! Clients send commands either as a RESP array of bulk strings or as an
//! inline command line. Both are decoded into a flat list of arguments,
//! with the command name first.
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((args, consumed)))` - A complete request, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the request is incomplete
//! - `Err(ParseError)` - Invalid protocol data
//!
//! The caller appends socket data to a buffer, calls `parse()`, and on success
//! advances the buffer by `consumed` bytes.

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur while decoding a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid integer format in a length line
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a length line or inline command
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative or zero
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Request arrays may only contain bulk strings
    #[error("unexpected element type: {0:#04x}")]
    UnexpectedElement(u8),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The request exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in one request.
pub const MAX_ARGS: usize = 1024 * 1024;

/// Argument slots reserved up front, whatever the declared count.
const PREALLOC_ARGS: usize = 64;

/// Request decoder.
///
/// # Example
///
/// ```
/// use flashbridge::protocol::RequestParser;
///
/// let parser = RequestParser::new();
/// let (args, consumed) = parser
///     .parse(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
///     .unwrap()
///     .unwrap();
/// assert_eq!(args.len(), 2);
/// assert_eq!(consumed, 23);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestParser;

impl RequestParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self
    }

    /// Attempts to decode one request from the front of `buf`.
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        match buf.first() {
            None => Ok(None),
            Some(&prefix::ARRAY) => self.parse_array(buf),
            Some(_) => self.parse_inline(buf),
        }
    }

    /// Parses `*<count>\r\n` followed by `count` bulk strings.
    fn parse_array(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        let (count, mut consumed) = match read_length(buf)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if count <= 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }
        let count = count as usize;
        if count > MAX_ARGS {
            return Err(ParseError::MessageTooLarge {
                size: count,
                max: MAX_ARGS,
            });
        }

        // The header alone must not size the allocation.
        let mut args = Vec::with_capacity(count.min(PREALLOC_ARGS));
        for _ in 0..count {
            match self.parse_bulk_string(&buf[consumed..])? {
                Some((arg, used)) => {
                    args.push(arg);
                    consumed += used;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((args, consumed)))
    }

    /// Parses `$<length>\r\n<data>\r\n`.
    fn parse_bulk_string(&self, buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
        match buf.first() {
            None => return Ok(None),
            Some(&prefix::BULK_STRING) => {}
            Some(&other) => return Err(ParseError::UnexpectedElement(other)),
        }

        let (length, data_start) = match read_length(buf)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }
        let length = length as usize;
        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let total_needed = data_start + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[data_start + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
        Ok(Some((data, total_needed)))
    }

    /// Parses an inline command such as `PING\r\n` or `GET name\r\n`.
    fn parse_inline(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        let crlf_pos = match find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let line = std::str::from_utf8(&buf[..crlf_pos])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

        let args: Vec<Bytes> = line
            .split_whitespace()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect();

        if args.is_empty() {
            return Err(ParseError::ProtocolError("empty inline command".to_string()));
        }

        Ok(Some((args, crlf_pos + 2)))
    }
}

/// Reads a `<prefix><integer>\r\n` header line.
///
/// Returns the integer and the number of bytes the header occupies.
fn read_length(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let end = match find_crlf(&buf[1..]) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let text = std::str::from_utf8(&buf[1..1 + end])
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    let value: i64 = text
        .parse()
        .map_err(|e: ParseIntError| ParseError::InvalidInteger(e.to_string()))?;

    Ok(Some((value, 1 + end + 2)))
}

/// Finds the position of `\r` in the first CRLF of the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}
