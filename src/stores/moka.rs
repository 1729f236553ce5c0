use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;

use crate::entry::RawEntry;
use crate::error::CacheError;
use crate::store::{Store, StoreHandle};
use crate::utils::build_cache_key;

/// Configuration for MokaStore.
#[derive(Debug, Clone, Default)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    ///
    /// `None` keeps every entry; documents are never expired by time.
    pub max_capacity: Option<u64>,
}

/// Concurrent in-memory store using Moka.
///
/// Suitable when many tasks reconcile different keys at once; reads and writes
/// do not contend on a single lock.
pub struct MokaStore {
    cache: Cache<String, RawEntry>,
}

impl MokaStore {
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store = MokaStore::new(MokaStoreConfig { max_capacity: Some(10_000) });
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(max_capacity) = config.max_capacity {
            builder = builder.max_capacity(max_capacity);
        }

        MokaStore {
            cache: builder.build(),
        }
    }

    /// Number of entries (approximate, for monitoring/debugging).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

struct MokaHandle {
    cache_id: String,
    cache: Cache<String, RawEntry>,
}

#[async_trait]
impl Store for MokaStore {
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn open(&self, cache_id: &str) -> Result<Arc<dyn StoreHandle>, CacheError> {
        // Clones share the same underlying cache
        Ok(Arc::new(MokaHandle {
            cache_id: cache_id.to_string(),
            cache: self.cache.clone(),
        }))
    }
}

#[async_trait]
impl StoreHandle for MokaHandle {
    async fn get(&self, key: &str) -> Result<Option<RawEntry>, CacheError> {
        let cache_key = build_cache_key(&self.cache_id, key);
        Ok(self.cache.get(&cache_key).await)
    }

    async fn put(&self, key: &str, entry: RawEntry) -> Result<(), CacheError> {
        let cache_key = build_cache_key(&self.cache_id, key);
        self.cache.insert(cache_key, entry).await;
        Ok(())
    }
}
