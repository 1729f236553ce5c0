use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::entry::RawEntry;
use crate::error::CacheError;
use crate::store::{Store, StoreHandle};
use crate::utils::build_cache_key;

/// Configuration for HashMapStore.
#[derive(Debug, Clone)]
pub struct HashMapStoreConfig {
    /// Whether `open` succeeds. A store created unavailable behaves like an
    /// environment without a caching facility until `set_available(true)`.
    pub available: bool,
}

impl Default for HashMapStoreConfig {
    fn default() -> Self {
        HashMapStoreConfig { available: true }
    }
}

type SharedState = Arc<RwLock<HashMap<String, RawEntry>>>;

/// Thread-safe in-memory store using HashMap with RwLock.
///
/// All caches opened from one store share a single map; keys are prefixed with
/// the cache id. Entries live as long as the store.
pub struct HashMapStore {
    state: SharedState,
    available: AtomicBool,
}

impl HashMapStore {
    /// Create a new HashMapStore with the given configuration.
    pub fn new(config: HashMapStoreConfig) -> Self {
        HashMapStore {
            state: Arc::new(RwLock::new(HashMap::new())),
            available: AtomicBool::new(config.available),
        }
    }

    /// Switch the store between available and unavailable.
    ///
    /// Handles opened earlier keep working.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of entries across all caches.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }
}

impl Default for HashMapStore {
    fn default() -> Self {
        Self::new(HashMapStoreConfig::default())
    }
}

struct HashMapHandle {
    cache_id: String,
    state: SharedState,
}

#[async_trait]
impl Store for HashMapStore {
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn open(&self, cache_id: &str) -> Result<Arc<dyn StoreHandle>, CacheError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable(
                self.name(),
                "in-memory store is disabled",
            ));
        }

        Ok(Arc::new(HashMapHandle {
            cache_id: cache_id.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl StoreHandle for HashMapHandle {
    async fn get(&self, key: &str) -> Result<Option<RawEntry>, CacheError> {
        let cache_key = build_cache_key(&self.cache_id, key);
        let state = self.state.read().await;
        Ok(state.get(&cache_key).cloned())
    }

    async fn put(&self, key: &str, entry: RawEntry) -> Result<(), CacheError> {
        let cache_key = build_cache_key(&self.cache_id, key);
        let mut state = self.state.write().await;
        state.insert(cache_key, entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: serde_json::Value) -> RawEntry {
        let serde_json::Value::Object(map) = value else {
            panic!("not an object");
        };
        RawEntry::from_document(key, &map).unwrap()
    }

    #[tokio::test]
    async fn test_get_put() {
        let store = HashMapStore::new(HashMapStoreConfig::default());
        let handle = store.open("app").await.unwrap();

        // Initially empty
        let result = handle.get("key1").await.unwrap();
        assert!(result.is_none());

        // Put a value
        handle.put("key1", entry("key1", json!({"v": 1}))).await.unwrap();
        let result = handle.get("key1").await.unwrap();
        assert_eq!(result, Some(entry("key1", json!({"v": 1}))));

        // Overwrite
        handle.put("key1", entry("key1", json!({"v": 2}))).await.unwrap();
        let result = handle.get("key1").await.unwrap().unwrap();
        assert_eq!(result.document().unwrap()["v"], json!(2));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_caches_are_isolated() {
        let store = HashMapStore::default();
        let a = store.open("a").await.unwrap();
        let b = store.open("b").await.unwrap();

        a.put("key1", entry("key1", json!({"v": 1}))).await.unwrap();

        assert!(a.get("key1").await.unwrap().is_some());
        assert!(b.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_open() {
        let store = HashMapStore::new(HashMapStoreConfig { available: false });
        let err = store.open("app").await.err().unwrap();
        assert!(err.is_unavailable());

        store.set_available(true);
        assert!(store.open("app").await.is_ok());
    }
}
