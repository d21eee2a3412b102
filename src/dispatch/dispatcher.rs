//! The Dispatcher
//!
//! Routes each decoded message to its specialized handler or to the cache
//! bridge, waits for the result without blocking the caller, and sends
//! exactly one reply on the message's session.
//!
//! ## Message States
//!
//! ```text
//!                 ┌─────────────────────┐
//!                 │       ROUTING       │  registry lookup
//!                 └──────────┬──────────┘
//!            hit ┌───────────┴───────────┐ miss
//!                ▼                       ▼
//!   ┌─────────────────────┐   ┌─────────────────────┐
//!   │ SPECIALIZED_PENDING │   │   GENERIC_PENDING   │  translate + execute
//!   └──────────┬──────────┘   └──────────┬──────────┘
//!              └───────────┬─────────────┘
//!                          ▼
//!                 ┌─────────────────────┐
//!                 │     RESPONDING      │  session.send(reply)
//!                 └──────────┬──────────┘
//!                            ▼
//!                          DONE
//! ```
//!
//! There is no separate error state. Handler errors, executor errors,
//! panicked tasks and timeouts all become error replies, so every message
//! reaches `RESPONDING` exactly once.
//!
//! Handler and executor futures run as their own tokio tasks. The
//! `JoinHandle` is the completion channel: a panic inside a handler shows
//! up as a `JoinError` instead of silently dropping the reply.

use crate::commands::{CommandHandler, HandlerRegistry, RedisCommand, RedisMessage};
use crate::connection::Session;
use crate::dispatch::bridge::{CacheBridge, OPERATION_ERROR, UNSUPPORTED_OPERATION};
use crate::protocol::RespValue;
use crate::storage::CacheExecutor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace, warn};

/// Reply text when a pending command exceeds the command timeout.
pub const OPERATION_TIMED_OUT: &str = "Operation timed out!";

/// Default bound on a single handler or executor call.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures of the task a command ran in, as opposed to the command itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command timed out after {0:?}")]
    TimedOut(Duration),

    #[error("command task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// Routes messages and sends their replies.
///
/// Shared across all connections behind an `Arc`; holds no mutable state.
pub struct Dispatcher {
    registry: HandlerRegistry,
    bridge: CacheBridge,
    command_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default command timeout.
    pub fn new(registry: HandlerRegistry, executor: Arc<dyn CacheExecutor>) -> Self {
        Self {
            registry,
            bridge: CacheBridge::new(executor),
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }

    /// Sets the bound on each handler/executor call. `None` waits forever.
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Accepts one decoded message from the transport.
    ///
    /// Returns immediately; the reply is sent from a spawned task. The
    /// returned handle completes once the reply has been handed to the
    /// session, which lets a caller serialize dispatch per session.
    pub fn on_message(
        self: &Arc<Self>,
        session: Arc<dyn Session>,
        message: RedisMessage,
    ) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let reply = dispatcher.process(message).await;
            dispatcher.respond(session.as_ref(), reply);
        })
    }

    /// Runs `message` to completion and returns it with its reply set.
    pub async fn process(&self, message: RedisMessage) -> RedisMessage {
        match self.registry.lookup(message.command()) {
            Some(handler) => self.run_specialized(handler, message).await,
            None => self.run_generic(message).await,
        }
    }

    async fn run_specialized(
        &self,
        handler: Arc<dyn CommandHandler>,
        message: RedisMessage,
    ) -> RedisMessage {
        let command = message.command();
        let client_id = message.client_id();
        let name = handler.name();

        let pending = tokio::spawn(async move { handler.handle(message).await });

        match self.complete(pending).await {
            Ok(Ok(reply)) if reply.response().is_some() => reply,
            Ok(Ok(_)) => {
                warn!(handler = name, %command, "Handler returned without a response");
                RedisMessage::error_reply(command, client_id, OPERATION_ERROR)
            }
            Ok(Err(e)) => {
                debug!(handler = name, %command, error = %e, "Handler failed");
                RedisMessage::error_reply(command, client_id, OPERATION_ERROR)
            }
            Err(e) => {
                let mut reply = RedisMessage::new(command, client_id, Vec::new());
                reply.set_response(failure_response(command, &e));
                reply
            }
        }
    }

    async fn run_generic(&self, mut message: RedisMessage) -> RedisMessage {
        let command = message.command();

        let request = match self.bridge.translate(&message) {
            Some(request) => request,
            None => {
                trace!(%command, "No cache mapping for command");
                message.set_response(RespValue::generic_error(UNSUPPORTED_OPERATION));
                return message;
            }
        };

        let bridge = self.bridge.clone();
        let pending = tokio::spawn(async move { bridge.execute(request).await });

        let response = match self.complete(pending).await {
            Ok(Ok(result)) => {
                if let Some(reason) = &result.error {
                    debug!(%command, reason = %reason, "Cache request failed");
                }
                self.bridge.frame_response(command, &result)
            }
            Ok(Err(e)) => {
                debug!(%command, error = %e, "Cache executor error");
                RespValue::generic_error(OPERATION_ERROR)
            }
            Err(e) => failure_response(command, &e),
        };

        message.set_response(response);
        message
    }

    /// Awaits a command task, bounded by the command timeout.
    async fn complete<T>(&self, mut pending: JoinHandle<T>) -> Result<T, DispatchError> {
        let limit = match self.command_timeout {
            Some(limit) => limit,
            None => return pending.await.map_err(DispatchError::from),
        };

        match tokio::time::timeout(limit, &mut pending).await {
            Ok(joined) => joined.map_err(DispatchError::from),
            Err(_) => {
                pending.abort();
                Err(DispatchError::TimedOut(limit))
            }
        }
    }

    fn respond(&self, session: &dyn Session, reply: RedisMessage) {
        let command = reply.command();
        if let Err(e) = session.send(reply) {
            debug!(session = session.id(), %command, error = %e, "Dropping reply");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

fn failure_response(command: RedisCommand, error: &DispatchError) -> RespValue {
    warn!(%command, error = %error, "Command did not complete");
    match error {
        DispatchError::TimedOut(_) => RespValue::generic_error(OPERATION_TIMED_OUT),
        DispatchError::TaskFailed(_) => RespValue::generic_error(OPERATION_ERROR),
    }
}
