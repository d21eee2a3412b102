//! Sharded In-Memory Key-Value Store
//!
//! The store behind [`crate::storage::StorageExecutor`]. It keeps binary
//! string values only; there are no expiry or data types here.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards by hash, so operations on different
//! keys rarely contend.

use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of shards for the storage engine.
const NUM_SHARDS: usize = 64;

#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<Bytes, Bytes>>,
}

impl Shard {
    // A panic while holding the lock leaves the map itself consistent:
    // every mutation is a single HashMap call.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
}

/// Thread-safe key-value store shared by all connections.
///
/// # Example
///
/// ```
/// use flashbridge::storage::StorageEngine;
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(engine.get(&Bytes::from("name")), Some(Bytes::from("Ariz")));
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,
    key_count: AtomicU64,
    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Shard::default()).collect(),
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    /// Sets a key, returning the previous value.
    pub fn set(&self, key: Bytes, value: Bytes) -> Option<Bytes> {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let previous = self.shard(&key).write().insert(key, value);
        if previous.is_none() {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }
        previous
    }

    pub fn get(&self, key: &Bytes) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.shard(key).read().get(key).cloned()
    }

    pub fn delete(&self, key: &Bytes) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let removed = self.shard(key).write().remove(key).is_some();
        if removed {
            self.key_count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Deletes keys, returning how many existed.
    pub fn delete_many(&self, keys: &[Bytes]) -> u64 {
        keys.iter().filter(|k| self.delete(k)).count() as u64
    }

    pub fn exists(&self, key: &Bytes) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Counts how many of the given keys exist. Repeated keys count twice.
    pub fn exists_many(&self, keys: &[Bytes]) -> u64 {
        keys.iter().filter(|k| self.exists(k)).count() as u64
    }

    /// Approximate number of keys.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
        }
    }
}
