//! Connection Module
//!
//! Owns everything socket-shaped: accepting clients, reading and decoding
//! requests, and writing replies. Each client runs in its own async task and
//! talks to the shared [`Dispatcher`](crate::dispatch::Dispatcher) through a
//! [`Session`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Server (TcpListener)                    │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept()
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Decode req  │───>│ Dispatcher  │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │ session     │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Writer task │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod handler;
pub mod server;
pub mod session;

pub use handler::{
    handle_connection, ConnectionError, ConnectionHandler, ConnectionOptions, ConnectionStats,
};
pub use server::Server;
pub use session::{ChannelSession, ConnectionObserver, Outgoing, Session, SessionError};
