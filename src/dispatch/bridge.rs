//! Generic Executor Adapter
//!
//! Translates wire commands without a specialized handler into cache
//! requests, and frames cache responses back into RESP.
//!
//! ## Translation
//!
//! | Redis    | Cache         | fields              |
//! |----------|---------------|---------------------|
//! | `GET`    | `Get`         | key                 |
//! | `SET`    | `Put`         | key, value          |
//! | `GETSET` | `GetAndPut`   | key, value          |
//! | `DEL`    | `Remove`      | keys                |
//! | `EXISTS` | `ContainsKey` | keys                |
//! | `DBSIZE` | `Size`        |                     |
//!
//! Every other command is not exposed through the cache path and is
//! answered with `-ERR Unsupported operation!` without reaching the executor.
//!
//! ## Framing
//!
//! | cache result               | rule      | reply                       |
//! |----------------------------|-----------|-----------------------------|
//! | success, payload           | `Bulk`    | bulk value                  |
//! | success, no payload        | `Bulk`    | nil                         |
//! | success                    | `Status`  | `+OK`                       |
//! | success, integer payload   | `Integer` | integer                     |
//! | success, other payload     | `Integer` | `-ERR Operation error!`     |
//! | success                    | none      | `-ERR Unsupported operation!` |
//! | failure                    | any       | `-ERR Operation error!`     |

use crate::commands::{RedisCommand, RedisMessage};
use crate::protocol::RespValue;
use crate::storage::{
    CacheCommand, CacheExecutor, CacheRequest, CacheResponse, CacheValue, ExecutorError,
};
use bytes::Bytes;
use std::sync::Arc;

/// Reply text for commands the bridge cannot serve.
pub const UNSUPPORTED_OPERATION: &str = "Unsupported operation!";

/// Reply text for any failed execution.
pub const OPERATION_ERROR: &str = "Operation error!";

/// How a successful cache response is framed for a given command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRule {
    /// Payload as a bulk value, absent payload as nil.
    Bulk,
    /// `+OK`, payload ignored.
    Status,
    /// Integer payload as a RESP integer.
    Integer,
}

/// The cache command a wire command maps to, if any.
pub fn cache_command(command: RedisCommand) -> Option<CacheCommand> {
    match command {
        RedisCommand::Get => Some(CacheCommand::Get),
        RedisCommand::Set => Some(CacheCommand::Put),
        RedisCommand::GetSet => Some(CacheCommand::GetAndPut),
        RedisCommand::Del => Some(CacheCommand::Remove),
        RedisCommand::Exists => Some(CacheCommand::ContainsKey),
        RedisCommand::DbSize => Some(CacheCommand::Size),
        _ => None,
    }
}

/// The framing rule for a command's successful responses, if it has one.
pub fn response_rule(command: RedisCommand) -> Option<ResponseRule> {
    match command {
        RedisCommand::Get | RedisCommand::GetSet => Some(ResponseRule::Bulk),
        RedisCommand::Set => Some(ResponseRule::Status),
        RedisCommand::Del | RedisCommand::Exists | RedisCommand::DbSize => {
            Some(ResponseRule::Integer)
        }
        _ => None,
    }
}

/// Builds the cache request for `message`.
///
/// Returns `None` when the command is not exposed through the cache path.
pub fn translate(message: &RedisMessage) -> Option<CacheRequest> {
    let command = cache_command(message.command())?;
    let request = CacheRequest::new(command, message.client_id());
    let args = message.args();

    let request = match command {
        CacheCommand::Get => request.with_key(message.key().cloned()),
        CacheCommand::Put | CacheCommand::GetAndPut => request
            .with_key(message.key().cloned())
            .with_value(args.get(1).cloned()),
        CacheCommand::Remove | CacheCommand::ContainsKey => request.with_keys(args.to_vec()),
        CacheCommand::Size => request,
    };

    Some(request)
}

/// Frames a cache response for `command`.
///
/// Pure: the same inputs always produce the same reply.
pub fn frame_response(command: RedisCommand, response: &CacheResponse) -> RespValue {
    if !response.is_success() {
        return RespValue::generic_error(OPERATION_ERROR);
    }

    match (response_rule(command), &response.payload) {
        (None, _) => RespValue::generic_error(UNSUPPORTED_OPERATION),
        (Some(ResponseRule::Bulk), None) => RespValue::nil(),
        (Some(ResponseRule::Bulk), Some(CacheValue::Bytes(data))) => {
            RespValue::bulk_string(data.clone())
        }
        (Some(ResponseRule::Bulk), Some(CacheValue::Integer(n))) => {
            RespValue::bulk_string(Bytes::from(n.to_string()))
        }
        (Some(ResponseRule::Status), _) => RespValue::ok(),
        (Some(ResponseRule::Integer), Some(CacheValue::Integer(n))) => RespValue::integer(*n),
        (Some(ResponseRule::Integer), _) => RespValue::generic_error(OPERATION_ERROR),
    }
}

/// Routes messages without a specialized handler to the cache executor.
#[derive(Clone)]
pub struct CacheBridge {
    executor: Arc<dyn CacheExecutor>,
}

impl CacheBridge {
    pub fn new(executor: Arc<dyn CacheExecutor>) -> Self {
        Self { executor }
    }

    pub fn translate(&self, message: &RedisMessage) -> Option<CacheRequest> {
        translate(message)
    }

    /// Runs `request` on the executor.
    pub async fn execute(&self, request: CacheRequest) -> Result<CacheResponse, ExecutorError> {
        self.executor.execute(request).await
    }

    pub fn frame_response(&self, command: RedisCommand, response: &CacheResponse) -> RespValue {
        frame_response(command, response)
    }
}

impl std::fmt::Debug for CacheBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBridge").finish_non_exhaustive()
    }
}
