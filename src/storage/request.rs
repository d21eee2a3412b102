//! Internal request model of the generic cache subsystem.
//!
//! The bridge never talks to a store directly. It builds a [`CacheRequest`],
//! hands it to a [`CacheExecutor`] and reads back a [`CacheResponse`].

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Commands understood by the cache subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCommand {
    Get,
    Put,
    GetAndPut,
    Remove,
    ContainsKey,
    Size,
}

impl fmt::Display for CacheCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheCommand::Get => "cache_get",
            CacheCommand::Put => "cache_put",
            CacheCommand::GetAndPut => "cache_get_and_put",
            CacheCommand::Remove => "cache_remove",
            CacheCommand::ContainsKey => "cache_contains_key",
            CacheCommand::Size => "cache_size",
        };
        f.write_str(name)
    }
}

/// A request for the cache subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub command: CacheCommand,
    pub client_id: u64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    /// Keys for multi-key commands.
    pub keys: Vec<Bytes>,
}

impl CacheRequest {
    pub fn new(command: CacheCommand, client_id: u64) -> Self {
        Self {
            command,
            client_id,
            key: None,
            value: None,
            keys: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: Option<Bytes>) -> Self {
        self.key = key;
        self
    }

    pub fn with_value(mut self, value: Option<Bytes>) -> Self {
        self.value = value;
        self
    }

    pub fn with_keys(mut self, keys: Vec<Bytes>) -> Self {
        self.keys = keys;
        self
    }
}

/// A value returned by the cache subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Bytes(Bytes),
    Integer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Success,
    Failed,
}

/// Outcome of a cache request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResponse {
    pub status: CacheStatus,
    pub payload: Option<CacheValue>,
    /// Reason for a failed status. Logged, never sent to the client.
    pub error: Option<String>,
}

impl CacheResponse {
    /// A successful response, with or without a payload.
    pub fn success(payload: Option<CacheValue>) -> Self {
        Self {
            status: CacheStatus::Success,
            payload,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: CacheStatus::Failed,
            payload: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CacheStatus::Success
    }
}

/// The executor could not produce a response at all.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("cache executor unavailable: {0}")]
    Unavailable(String),
}

/// Executes cache requests asynchronously.
///
/// `Ok` with [`CacheStatus::Failed`] means the request ran and failed;
/// `Err` means the executor itself could not run it.
#[async_trait]
pub trait CacheExecutor: Send + Sync {
    async fn execute(&self, request: CacheRequest) -> Result<CacheResponse, ExecutorError>;
}
