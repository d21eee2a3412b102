//! Specialized Command Handlers
//!
//! A specialized handler fully owns execution and reply construction for
//! the commands it declares. Anything without a handler goes through the
//! generic cache path in [`crate::dispatch`].
//!
//! ```text
//!   RedisMessage ──> CommandHandler::handle() ──> RedisMessage (response set)
//!                            │
//!                            └── Err(HandlerError) ──> "-ERR Operation error!"
//! ```

use crate::commands::command::RedisCommand;
use crate::commands::message::RedisMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a handler through its result.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler was given a command outside its supported set.
    #[error("handler '{handler}' does not support {command}")]
    Unsupported {
        handler: &'static str,
        command: RedisCommand,
    },

    #[error("{0}")]
    Failed(String),
}

/// Logic for one or more specialized commands.
///
/// `handle` must not block the runtime; long-running work should be
/// awaited, not run inline. Failures are returned, never panicked.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name used in logs and registry errors.
    fn name(&self) -> &'static str;

    /// Commands this handler answers. Queried once, at registration.
    fn supported_commands(&self) -> &'static [RedisCommand];

    /// Executes the command and returns the message with its response set.
    async fn handle(&self, message: RedisMessage) -> Result<RedisMessage, HandlerError>;
}
