//! Cache executor backed by the in-memory [`StorageEngine`].

use crate::storage::engine::StorageEngine;
use crate::storage::request::{
    CacheCommand, CacheExecutor, CacheRequest, CacheResponse, CacheValue, ExecutorError,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

/// Runs cache requests against a shared [`StorageEngine`].
#[derive(Debug, Clone)]
pub struct StorageExecutor {
    storage: Arc<StorageEngine>,
}

impl StorageExecutor {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    fn run(&self, request: CacheRequest) -> CacheResponse {
        let CacheRequest {
            command,
            key,
            value,
            keys,
            ..
        } = request;

        match command {
            CacheCommand::Get => match key {
                Some(key) => {
                    CacheResponse::success(self.storage.get(&key).map(CacheValue::Bytes))
                }
                None => CacheResponse::failed("missing key"),
            },
            CacheCommand::Put => match (key, value) {
                (Some(key), Some(value)) => {
                    self.storage.set(key, value);
                    CacheResponse::success(None)
                }
                _ => CacheResponse::failed("missing key or value"),
            },
            CacheCommand::GetAndPut => match (key, value) {
                (Some(key), Some(value)) => {
                    CacheResponse::success(self.storage.set(key, value).map(CacheValue::Bytes))
                }
                _ => CacheResponse::failed("missing key or value"),
            },
            CacheCommand::Remove if keys.is_empty() => CacheResponse::failed("missing keys"),
            CacheCommand::Remove => {
                let removed = self.storage.delete_many(&keys);
                CacheResponse::success(Some(CacheValue::Integer(removed as i64)))
            }
            CacheCommand::ContainsKey if keys.is_empty() => CacheResponse::failed("missing keys"),
            CacheCommand::ContainsKey => {
                let found = self.storage.exists_many(&keys);
                CacheResponse::success(Some(CacheValue::Integer(found as i64)))
            }
            CacheCommand::Size => {
                CacheResponse::success(Some(CacheValue::Integer(self.storage.len() as i64)))
            }
        }
    }
}

#[async_trait]
impl CacheExecutor for StorageExecutor {
    async fn execute(&self, request: CacheRequest) -> Result<CacheResponse, ExecutorError> {
        trace!(command = %request.command, client = request.client_id, "Executing cache request");
        Ok(self.run(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn executor() -> StorageExecutor {
        StorageExecutor::new(Arc::new(StorageEngine::new()))
    }

    async fn exec(executor: &StorageExecutor, request: CacheRequest) -> CacheResponse {
        executor.execute(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let executor = executor();
        let put = CacheRequest::new(CacheCommand::Put, 1)
            .with_key(Some(Bytes::from("answer")))
            .with_value(Some(Bytes::from("42")));
        assert_eq!(exec(&executor, put).await, CacheResponse::success(None));

        let get = CacheRequest::new(CacheCommand::Get, 1).with_key(Some(Bytes::from("answer")));
        assert_eq!(
            exec(&executor, get).await,
            CacheResponse::success(Some(CacheValue::Bytes(Bytes::from("42"))))
        );
    }

    #[tokio::test]
    async fn test_get_missing_key_has_no_payload() {
        let executor = executor();
        let get = CacheRequest::new(CacheCommand::Get, 1).with_key(Some(Bytes::from("nope")));
        let response = exec(&executor, get).await;
        assert!(response.is_success());
        assert_eq!(response.payload, None);
    }

    #[tokio::test]
    async fn test_get_and_put_returns_previous() {
        let executor = executor();
        executor.storage().set(Bytes::from("k"), Bytes::from("old"));

        let request = CacheRequest::new(CacheCommand::GetAndPut, 1)
            .with_key(Some(Bytes::from("k")))
            .with_value(Some(Bytes::from("new")));
        assert_eq!(
            exec(&executor, request).await.payload,
            Some(CacheValue::Bytes(Bytes::from("old")))
        );
        assert_eq!(executor.storage().get(&Bytes::from("k")), Some(Bytes::from("new")));
    }

    #[tokio::test]
    async fn test_remove_contains_and_size() {
        let executor = executor();
        executor.storage().set(Bytes::from("a"), Bytes::from("1"));
        executor.storage().set(Bytes::from("b"), Bytes::from("2"));

        let keys = vec![Bytes::from("a"), Bytes::from("z")];
        let contains = CacheRequest::new(CacheCommand::ContainsKey, 1).with_keys(keys.clone());
        assert_eq!(exec(&executor, contains).await.payload, Some(CacheValue::Integer(1)));

        let remove = CacheRequest::new(CacheCommand::Remove, 1).with_keys(keys);
        assert_eq!(exec(&executor, remove).await.payload, Some(CacheValue::Integer(1)));

        let size = CacheRequest::new(CacheCommand::Size, 1);
        assert_eq!(exec(&executor, size).await.payload, Some(CacheValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_incomplete_request_fails() {
        let executor = executor();
        let response = exec(&executor, CacheRequest::new(CacheCommand::Get, 1)).await;
        assert_eq!(response.status, crate::storage::CacheStatus::Failed);
        assert_eq!(response.error.as_deref(), Some("missing key"));
    }
}
