//! Generic Cache Subsystem
//!
//! Everything without a specialized handler is executed here. The bridge
//! depends only on the [`CacheExecutor`] trait; [`StorageExecutor`] is the
//! bundled implementation over a sharded in-memory map.
//!
//! ## Architecture
//!
//! ```text
//!   CacheRequest ──> CacheExecutor::execute() ──> CacheResponse
//!                          │                      (status + payload)
//!                          ▼
//!                   ┌─────────────────────────────────────┐
//!                   │           StorageEngine             │
//!                   │  ┌─────────┐ ┌─────────┐ ┌───────┐  │
//!                   │  │ Shard 0 │ │ Shard 1 │ │...64  │  │
//!                   │  │ RwLock  │ │ RwLock  │ │shards │  │
//!                   │  └─────────┘ └─────────┘ └───────┘  │
//!                   └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use flashbridge::storage::{
//!     CacheCommand, CacheExecutor, CacheRequest, CacheValue, StorageEngine, StorageExecutor,
//! };
//! use bytes::Bytes;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let storage = Arc::new(StorageEngine::new());
//! storage.set(Bytes::from("name"), Bytes::from("Ariz"));
//!
//! let executor = StorageExecutor::new(storage);
//! let request = CacheRequest::new(CacheCommand::Get, 1).with_key(Some(Bytes::from("name")));
//! let response = executor.execute(request).await.unwrap();
//! assert_eq!(response.payload, Some(CacheValue::Bytes(Bytes::from("Ariz"))));
//! # });
//! ```

pub mod engine;
pub mod executor;
pub mod request;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
pub use executor::StorageExecutor;
pub use request::{
    CacheCommand, CacheExecutor, CacheRequest, CacheResponse, CacheStatus, CacheValue,
    ExecutorError,
};
