use std::future::Future;
use std::sync::Arc;

use crate::config::JsonCacheConfig;
use crate::entry::{Document, RawEntry, tag, tagged};
use crate::error::CacheError;
use crate::fetch::CachedFetch;
use crate::locks::KeyLocks;
use crate::store::{Store, StoreHandle};

/// Result of looking a key up with [`JsonCache::find`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A cached document. It carries `cacheName` equal to the key.
    Hit(Document),
    /// Nothing is cached under the key.
    Miss,
    /// The store could not be opened or the entry could not be read.
    Unavailable,
}

impl CacheLookup {
    /// Whether a document was found.
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// The cached document, if any.
    pub fn document(&self) -> Option<&Document> {
        match self {
            CacheLookup::Hit(document) => Some(document),
            CacheLookup::Miss | CacheLookup::Unavailable => None,
        }
    }

    /// Consume the lookup, returning the cached document if any.
    pub fn into_document(self) -> Option<Document> {
        match self {
            CacheLookup::Hit(document) => Some(document),
            CacheLookup::Miss | CacheLookup::Unavailable => None,
        }
    }
}

/// Outcome of [`JsonCache::check_and_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The cache already held the same document; nothing was written.
    Unchanged,
    /// The document differed or was missing and has been written. Holds the
    /// stored document, tagged with `cacheName`.
    Updated(Document),
    /// The store is unavailable. Holds the fresh document exactly as given;
    /// nothing was cached.
    Uncached(Document),
}

impl Reconciliation {
    /// Whether the caller got a document to act on (anything but `Unchanged`).
    pub fn is_changed(&self) -> bool {
        !matches!(self, Reconciliation::Unchanged)
    }

    /// The resulting document, `None` when unchanged.
    pub fn document(&self) -> Option<&Document> {
        match self {
            Reconciliation::Unchanged => None,
            Reconciliation::Updated(document) | Reconciliation::Uncached(document) => {
                Some(document)
            }
        }
    }

    /// Consume the outcome, returning the resulting document if any.
    pub fn into_document(self) -> Option<Document> {
        match self {
            Reconciliation::Unchanged => None,
            Reconciliation::Updated(document) | Reconciliation::Uncached(document) => {
                Some(document)
            }
        }
    }
}

/// Reconciliation engine: reads, compares and conditionally writes JSON
/// documents in one cache of a [`Store`].
///
/// Every document written carries a `cacheName` field equal to its key.
/// Clones share the store, the configuration and the per-key locks.
#[derive(Clone)]
pub struct JsonCache {
    store: Arc<dyn Store>,
    config: Arc<JsonCacheConfig>,
    locks: KeyLocks,
}

impl JsonCache {
    /// Create a cache over `store` with the default configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store = Arc::new(HashMapStore::default());
    /// let cache = JsonCache::new(store);
    /// ```
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, JsonCacheConfig::default())
    }

    /// Create a cache over `store` with an explicit configuration.
    pub fn with_config(store: Arc<dyn Store>, config: JsonCacheConfig) -> Self {
        JsonCache {
            store,
            config: Arc::new(config),
            locks: KeyLocks::default(),
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &JsonCacheConfig {
        &self.config
    }

    async fn open(&self) -> Result<Arc<dyn StoreHandle>, CacheError> {
        self.store.open(&self.config.cache_id).await
    }

    async fn lookup(&self, key: &str) -> Result<Option<Document>, CacheError> {
        let handle = self.open().await?;
        let Some(entry) = handle.get(key).await? else {
            return Ok(None);
        };
        entry.document().map(Some)
    }

    /// Return the cached document for `key`.
    ///
    /// Never fails: a miss and an unusable store are reported through
    /// [`CacheLookup`].
    pub async fn find(&self, key: &str) -> CacheLookup {
        match self.lookup(key).await {
            Ok(Some(document)) => CacheLookup::Hit(document),
            Ok(None) => {
                tracing::info!(
                    "No cached json: store={}, cache={}, key={}",
                    self.store.name(),
                    self.config.cache_id,
                    key
                );
                CacheLookup::Miss
            }
            Err(e) => {
                tracing::warn!(
                    "Cache lookup failed: store={}, cache={}, key={}, error={}",
                    self.store.name(),
                    self.config.cache_id,
                    key,
                    e
                );
                CacheLookup::Unavailable
            }
        }
    }

    /// Tag `document` with `cacheName = key` and write it, replacing any
    /// previous document.
    ///
    /// Returns the document as stored. Fails when the store cannot be opened
    /// or the write fails.
    pub async fn create_or_update(
        &self,
        key: &str,
        document: Document,
    ) -> Result<Document, CacheError> {
        let document = tag(key, document);
        let entry = RawEntry::from_document(key, &document)?;

        let handle = self.open().await?;
        handle.put(key, entry).await?;

        tracing::debug!(
            "Cached json: store={}, cache={}, key={}",
            self.store.name(),
            self.config.cache_id,
            key
        );
        Ok(document)
    }

    /// Compare `document` with the cached copy and write it if it changed.
    ///
    /// - `Unchanged` when the cached copy equals `document` tagged with the key
    /// - `Updated` with the stored document when nothing was cached or it differed
    /// - `Uncached` with `document` untouched when the store is unavailable
    ///
    /// A write that fails on an opened store is returned as an error.
    pub async fn check_and_update(
        &self,
        key: &str,
        document: Document,
    ) -> Result<Reconciliation, CacheError> {
        let _guard = if self.config.serialize_per_key {
            Some(self.locks.lock(key).await)
        } else {
            None
        };

        let cached = match self.lookup(key).await {
            Ok(cached) => cached,
            Err(e) if e.is_unavailable() => return Ok(self.pass_through(key, document, &e)),
            Err(e) => {
                tracing::warn!(
                    "Unreadable cached json will be replaced: store={}, cache={}, key={}, error={}",
                    self.store.name(),
                    self.config.cache_id,
                    key,
                    e
                );
                None
            }
        };

        let fresh = tagged(key, &document);
        let unchanged = cached
            .as_ref()
            .is_some_and(|cached| self.config.equality.same(&fresh, cached));

        if unchanged {
            tracing::debug!(
                "Cached json up to date: cache={}, key={}",
                self.config.cache_id,
                key
            );
            return Ok(Reconciliation::Unchanged);
        }

        match self.create_or_update(key, fresh).await {
            Ok(stored) => Ok(Reconciliation::Updated(stored)),
            Err(e) if e.is_unavailable() => Ok(self.pass_through(key, document, &e)),
            Err(e) => Err(e),
        }
    }

    fn pass_through(&self, key: &str, document: Document, error: &CacheError) -> Reconciliation {
        tracing::warn!(
            "Cache store unavailable, fresh json not cached: store={}, cache={}, key={}, error={}",
            self.store.name(),
            self.config.cache_id,
            key,
            error
        );
        Reconciliation::Uncached(document)
    }

    /// Pair `fetch` with `key` for a cached read.
    ///
    /// See [`CachedFetch::cached`].
    pub fn fetch<F>(&self, key: impl Into<String>, fetch: F) -> CachedFetch<F>
    where
        F: Future,
    {
        CachedFetch::new(self, key, fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Equality;
    use crate::stores::disabled::DisabledStore;
    use crate::stores::memory::{HashMapStore, HashMapStoreConfig};
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn memory_cache() -> (Arc<HashMapStore>, JsonCache) {
        let store = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let cache = JsonCache::new(store.clone());
        (store, cache)
    }

    #[tokio::test]
    async fn test_find_miss_is_not_an_error() {
        let (_, cache) = memory_cache();
        assert_eq!(cache.find("unknown-key").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_create_or_update_then_find() {
        let (_, cache) = memory_cache();

        let stored = cache
            .create_or_update("x", doc(json!({"a": 1, "b": [true, null]})))
            .await
            .unwrap();
        assert_eq!(stored["cacheName"], json!("x"));

        let found = cache.find("x").await;
        assert_eq!(
            found.document().cloned().map(Value::Object),
            Some(json!({"a": 1, "b": [true, null], "cacheName": "x"}))
        );
    }

    #[tokio::test]
    async fn test_check_and_update_is_idempotent() {
        let (_, cache) = memory_cache();

        let first = cache.check_and_update("x", doc(json!({"a": 1}))).await.unwrap();
        assert!(matches!(first, Reconciliation::Updated(_)));

        let second = cache.check_and_update("x", doc(json!({"a": 1}))).await.unwrap();
        assert_eq!(second, Reconciliation::Unchanged);
        assert!(!second.is_changed());
    }

    #[tokio::test]
    async fn test_check_and_update_detects_change() {
        let (_, cache) = memory_cache();
        cache.create_or_update("x", doc(json!({"a": 1}))).await.unwrap();

        let changed = cache.check_and_update("x", doc(json!({"a": 2}))).await.unwrap();
        assert_eq!(changed.document().map(|d| d["a"].clone()), Some(json!(2)));

        let again = cache.check_and_update("x", doc(json!({"a": 2}))).await.unwrap();
        assert_eq!(again, Reconciliation::Unchanged);
    }

    #[tokio::test]
    async fn test_check_and_update_degrades_when_unavailable() {
        let cache = JsonCache::new(Arc::new(DisabledStore));

        let result = cache.check_and_update("x", doc(json!({"a": 1}))).await.unwrap();
        assert_eq!(result, Reconciliation::Uncached(doc(json!({"a": 1}))));
        assert_eq!(cache.find("x").await, CacheLookup::Unavailable);
    }

    #[tokio::test]
    async fn test_create_or_update_fails_when_unavailable() {
        let cache = JsonCache::new(Arc::new(DisabledStore));

        let err = cache
            .create_or_update("x", doc(json!({"a": 1})))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_textual_equality_rewrites_reordered_fields() {
        let (_, cache) = memory_cache();
        cache
            .create_or_update("x", doc(json!({"a": 1, "b": 2})))
            .await
            .unwrap();

        let result = cache
            .check_and_update("x", doc(json!({"b": 2, "a": 1})))
            .await
            .unwrap();
        assert!(matches!(result, Reconciliation::Updated(_)));
    }

    #[tokio::test]
    async fn test_structural_equality_ignores_field_order() {
        let store = Arc::new(HashMapStore::default());
        let config = JsonCacheConfig::new().with_equality(Equality::Structural);
        let cache = JsonCache::with_config(store, config);

        cache
            .create_or_update("x", doc(json!({"a": 1, "b": 2})))
            .await
            .unwrap();

        let result = cache
            .check_and_update("x", doc(json!({"b": 2, "a": 1})))
            .await
            .unwrap();
        assert_eq!(result, Reconciliation::Unchanged);
    }

    #[tokio::test]
    async fn test_cache_ids_are_isolated() {
        let store: Arc<dyn Store> = Arc::new(HashMapStore::default());
        let v1 = JsonCache::with_config(store.clone(), JsonCacheConfig::new().with_cache_id("v1"));
        let v2 = JsonCache::with_config(store, JsonCacheConfig::new().with_cache_id("v2"));

        v1.create_or_update("x", doc(json!({"a": 1}))).await.unwrap();

        assert!(v1.find("x").await.is_hit());
        assert_eq!(v2.find("x").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_separator_in_cache_id_does_not_alias_keys() {
        let store: Arc<dyn Store> = Arc::new(HashMapStore::default());
        let app_config = JsonCacheConfig::new().with_cache_id("app");
        let app = JsonCache::with_config(store.clone(), app_config);
        let app_user_config = JsonCacheConfig::new().with_cache_id("app::user");
        let app_user = JsonCache::with_config(store, app_user_config);

        app.create_or_update("user::1", doc(json!({"owner": "app"})))
            .await
            .unwrap();
        assert_eq!(app_user.find("1").await, CacheLookup::Miss);

        app_user
            .create_or_update("1", doc(json!({"owner": "app::user"})))
            .await
            .unwrap();
        let found = app.find("user::1").await.into_document().unwrap();
        assert_eq!(found["cacheName"], json!("user::1"));
        assert_eq!(found["owner"], json!("app"));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_unavailable_then_replaced() {
        let (store, cache) = memory_cache();
        let handle = store.open(&cache.config().cache_id).await.unwrap();
        handle
            .put(
                "x",
                RawEntry {
                    status: 200,
                    status_text: "cached result for x".to_string(),
                    content_type: "application/json".to_string(),
                    body: "{truncated".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(cache.find("x").await, CacheLookup::Unavailable);

        let result = cache.check_and_update("x", doc(json!({"a": 1}))).await.unwrap();
        assert!(matches!(result, Reconciliation::Updated(_)));
        assert!(cache.find("x").await.is_hit());
    }
}
