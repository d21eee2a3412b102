//! RESP Protocol Implementation
//!
//! The wire codec consumed by the dispatcher: a request decoder that turns
//! raw bytes into argument lists, and the reply values written back.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum, its serialization and the
//!   nil / bulk / generic-error helpers
//! - `parser`: Incremental decoder for incoming requests
//!
//! ## Example
//!
//! ```
//! use flashbridge::protocol::{RequestParser, RespValue};
//!
//! let (args, _) = RequestParser::new()
//!     .parse(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(&args[0][..], b"GET");
//!
//! let reply = RespValue::bulk_string("Ariz");
//! assert_eq!(reply.serialize(), b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{ParseError, ParseResult, RequestParser};
pub use types::RespValue;
