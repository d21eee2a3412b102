//! Command Layer
//!
//! The command set understood on the wire, the message that carries one
//! request through the pipeline, and the specialized handlers that answer
//! commands locally.
//!
//! ## Architecture
//!
//! ```text
//!   argument list (protocol module)
//!          │
//!          ▼
//!   RedisMessage::decode()        unknown name / bad arity ──> error reply
//!          │
//!          ▼
//!   HandlerRegistry::lookup()
//!          │
//!     ┌────┴──────────────┐
//!     ▼                   ▼
//!   CommandHandler     generic cache path (dispatch module)
//! ```
//!
//! ## Specialized Commands
//!
//! - `PING [message]`, `ECHO message`, `QUIT`: [`ConnectionCommandHandler`]

pub mod command;
pub mod connection;
pub mod handler;
pub mod message;
pub mod registry;

pub use command::{Arity, RedisCommand};
pub use connection::ConnectionCommandHandler;
pub use handler::{CommandHandler, HandlerError};
pub use message::{DecodeError, RedisMessage};
pub use registry::{HandlerRegistry, RegistryBuilder, RegistryError};
