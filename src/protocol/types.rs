//! RESP Reply Types
//!
//! This module defines the values FlashBridge writes back to clients.
//! Requests only ever arrive as arrays of bulk strings (or inline commands),
//! so the decoder in [`crate::protocol::parser`] produces plain argument
//! vectors and `RespValue` is used on the reply side.
//!
//! ## Protocol Format
//!
//! Each RESP type starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! All types are terminated with CRLF (`\r\n`).
//!
//! ## The Three Bridge Framings
//!
//! Replies produced from the generic cache path take one of three shapes:
//!
//! ```text
//! bulk value     $2\r\n42\r\n
//! nil            $-1\r\n
//! generic error  -ERR Operation error!\r\n
//! ```

use bytes::Bytes;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// Prefix used for generic error replies.
pub const GENERIC_ERROR_PREFIX: &str = "ERR";

/// A value in the RESP protocol, as written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe status line, e.g. `+OK\r\n`.
    SimpleString(String),

    /// Error line, e.g. `-ERR unknown command\r\n`.
    Error(String),

    /// Signed 64-bit integer, e.g. `:1000\r\n`.
    Integer(i64),

    /// Binary-safe string, e.g. `$5\r\nhello\r\n`.
    BulkString(Bytes),

    /// Null bulk string `$-1\r\n`.
    Null,
}

impl RespValue {
    /// Creates an error response with the message written as-is.
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates a generic error response: `-ERR <message>`.
    ///
    /// # Example
    /// ```
    /// use flashbridge::protocol::RespValue;
    /// let err = RespValue::generic_error("Operation error!");
    /// assert_eq!(err.serialize(), b"-ERR Operation error!\r\n");
    /// ```
    pub fn generic_error(message: impl AsRef<str>) -> Self {
        RespValue::Error(format!("{} {}", GENERIC_ERROR_PREFIX, message.as_ref()))
    }

    /// Creates a new integer response.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk value response from arbitrary payload bytes.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// The protocol "nil" token.
    pub fn nil() -> Self {
        RespValue::Null
    }

    /// Common response for successful operations
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Common response for PONG
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes the RESP value to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the RESP value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::BulkString(data) => {
                write_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
        }
    }
}

#[inline]
fn write_line(buf: &mut Vec<u8>, prefix: u8, body: &[u8]) {
    buf.push(prefix);
    buf.extend_from_slice(body);
    buf.extend_from_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_error_serialize() {
        let value = RespValue::generic_error("Unsupported operation!");
        assert_eq!(value.serialize(), b"-ERR Unsupported operation!\r\n");
    }

    #[test]
    fn test_nil_serialize() {
        let value = RespValue::nil();
        assert_eq!(value.serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_bulk_string_serialize() {
        let value = RespValue::bulk_string(Bytes::from("42"));
        assert_eq!(value.serialize(), b"$2\r\n42\r\n");

        let empty = RespValue::bulk_string(Bytes::new());
        assert_eq!(empty.serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn test_integer_serialize() {
        assert_eq!(RespValue::integer(1000).serialize(), b":1000\r\n");
        assert_eq!(RespValue::integer(-42).serialize(), b":-42\r\n");
    }

    #[test]
    fn test_status_replies() {
        assert_eq!(RespValue::ok().serialize(), b"+OK\r\n");
        assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
    }
}
