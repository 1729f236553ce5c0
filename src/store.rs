use async_trait::async_trait;
use std::sync::Arc;

use crate::entry::RawEntry;
use crate::error::CacheError;

/// A store is the persistent key-value facility documents are cached in.
///
/// A store holds any number of independent caches, each selected by a cache id.
/// Opening fails with `CacheError::StoreUnavailable` when the facility cannot
/// be used in the current environment.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "redis"
    /// - "metrics"
    fn name(&self) -> &'static str;

    /// Open the cache named `cache_id`.
    async fn open(&self, cache_id: &str) -> Result<Arc<dyn StoreHandle>, CacheError>;
}

/// An opened cache inside a [`Store`].
#[async_trait]
pub trait StoreHandle: Send + Sync {
    /// Return the entry stored under `key`.
    ///
    /// The response must be `None` for cache misses.
    async fn get(&self, key: &str) -> Result<Option<RawEntry>, CacheError>;

    /// Store `entry` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, entry: RawEntry) -> Result<(), CacheError>;
}
