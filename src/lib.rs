//! # FlashBridge - A Redis Protocol Bridge
//!
//! FlashBridge accepts Redis (RESP) clients and answers them either with a
//! specialized command handler or by translating the request into a generic
//! cache operation run by a pluggable executor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             FlashBridge                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│ Dispatcher  │                  │
//! │  │ (Listener)  │    │  Handler    │    │             │                  │
//! │  └─────────────┘    └──────▲──────┘    └──┬───────┬──┘                  │
//! │                            │ session      │       │                     │
//! │                            │         registry hit  miss                 │
//! │  ┌─────────────┐           │              ▼       ▼                     │
//! │  │   RESP      │           │   ┌──────────────┐ ┌──────────────────┐    │
//! │  │   Parser    │           │   │CommandHandler│ │ CacheBridge      │    │
//! │  └─────────────┘           │   │ (PING, ECHO, │ │  translate       │    │
//! │                            │   │  QUIT)       │ │  CacheExecutor   │    │
//! │                            │   └──────┬───────┘ │  frame_response  │    │
//! │                            │          │         └────────┬─────────┘    │
//! │                            └──────────┴──────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use flashbridge::commands::HandlerRegistry;
//! use flashbridge::config::ServerConfig;
//! use flashbridge::connection::Server;
//! use flashbridge::dispatch::Dispatcher;
//! use flashbridge::storage::{StorageEngine, StorageExecutor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let executor = Arc::new(StorageExecutor::new(Arc::new(StorageEngine::new())));
//!     let dispatcher = Dispatcher::new(HandlerRegistry::with_builtin_handlers()?, executor)
//!         .with_command_timeout(config.command_timeout);
//!
//!     Server::bind(&config, Arc::new(dispatcher)).await?.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### Specialized
//! - `PING [message]`
//! - `ECHO message`
//! - `QUIT`
//!
//! ### Generic cache operations
//! - `GET key`
//! - `SET key value`
//! - `GETSET key value`
//! - `DEL key [key ...]`
//! - `EXISTS key [key ...]`
//! - `DBSIZE`
//!
//! Other recognized commands (`INCR`, `MGET`, ...) are answered with
//! `-ERR Unsupported operation!`.
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP request parser and reply types
//! - [`commands`]: command set, messages, and the handler registry
//! - [`dispatch`]: the dispatcher and the generic cache bridge
//! - [`storage`]: the cache executor contract and an in-memory executor
//! - [`connection`]: sockets, sessions, and the accept loop
//! - [`config`]: server settings and command-line arguments

pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, HandlerRegistry, RedisCommand, RedisMessage};
pub use config::ServerConfig;
pub use connection::{ConnectionStats, Server, Session};
pub use dispatch::{CacheBridge, Dispatcher};
pub use protocol::{ParseError, RequestParser, RespValue};
pub use storage::{CacheExecutor, StorageEngine, StorageExecutor};

/// The default port FlashBridge listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host FlashBridge binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of FlashBridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
