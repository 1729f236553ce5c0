//! Metrics middleware for cache stores.
//!
//! This module provides a `MetricsStore` wrapper that emits metrics for every
//! store operation (opens, reads, writes) to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use swr_json_cache::{JsonCache, MokaStore, MokaStoreConfig, Store};
//! use swr_json_cache::{CacheMetric, MetricsSink, MetricsStore};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//!
//! let moka = Arc::new(MokaStore::new(MokaStoreConfig::default()));
//! let store: Arc<dyn Store> = Arc::new(MetricsStore::new(moka, sink.clone()));
//!
//! // Metrics are emitted for every lookup and write the cache performs
//! let cache = JsonCache::new(store);
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::RawEntry;
use crate::error::CacheError;
use crate::store::{Store, StoreHandle};

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone)]
pub enum CacheMetric {
    /// Emitted on every attempt to open a cache.
    Open {
        /// The cache id that was opened.
        cache_id: String,
        /// Whether the store could be opened.
        available: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the wrapped store (from Store::name()).
        store: String,
    },
    /// Emitted on every read.
    Read {
        /// The key that was read.
        key: String,
        /// Whether an entry was found. Failed reads count as misses.
        hit: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the wrapped store (from Store::name()).
        store: String,
        /// The cache id the handle was opened with.
        cache_id: String,
    },
    /// Emitted on every write.
    Write {
        /// The key that was written.
        key: String,
        /// Whether the write succeeded.
        success: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the wrapped store (from Store::name()).
        store: String,
        /// The cache id the handle was opened with.
        cache_id: String,
    },
}

/// Trait for receiving cache metrics.
///
/// Implement this trait to collect metrics from `MetricsStore`.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// This is called synchronously in the hot path of cache operations.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: CacheMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A store wrapper that emits metrics for all operations.
pub struct MetricsStore {
    inner: Arc<dyn Store>,
    sink: Arc<dyn MetricsSink>,
    store_name: String,
}

impl MetricsStore {
    /// Create a new MetricsStore wrapping the given store.
    pub fn new(inner: Arc<dyn Store>, sink: Arc<dyn MetricsSink>) -> Self {
        let store_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            store_name,
        }
    }

    /// Get a reference to the metrics sink.
    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

struct MetricsHandle {
    inner: Arc<dyn StoreHandle>,
    sink: Arc<dyn MetricsSink>,
    store_name: String,
    cache_id: String,
}

#[async_trait]
impl Store for MetricsStore {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn open(&self, cache_id: &str) -> Result<Arc<dyn StoreHandle>, CacheError> {
        let start = Instant::now();
        let result = self.inner.open(cache_id).await;

        self.sink.emit(CacheMetric::Open {
            cache_id: cache_id.to_string(),
            available: result.is_ok(),
            latency_ms: elapsed_ms(start),
            store: self.store_name.clone(),
        });

        let inner = result?;
        Ok(Arc::new(MetricsHandle {
            inner,
            sink: Arc::clone(&self.sink),
            store_name: self.store_name.clone(),
            cache_id: cache_id.to_string(),
        }))
    }
}

#[async_trait]
impl StoreHandle for MetricsHandle {
    async fn get(&self, key: &str) -> Result<Option<RawEntry>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;

        self.sink.emit(CacheMetric::Read {
            key: key.to_string(),
            hit: matches!(result, Ok(Some(_))),
            latency_ms: elapsed_ms(start),
            store: self.store_name.clone(),
            cache_id: self.cache_id.clone(),
        });

        result
    }

    async fn put(&self, key: &str, entry: RawEntry) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.put(key, entry).await;

        self.sink.emit(CacheMetric::Write {
            key: key.to_string(),
            success: result.is_ok(),
            latency_ms: elapsed_ms(start),
            store: self.store_name.clone(),
            cache_id: self.cache_id.clone(),
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::disabled::DisabledStore;
    use crate::stores::memory::{HashMapStore, HashMapStoreConfig};
    use std::sync::Mutex;

    struct TestSink {
        metrics: Mutex<Vec<CacheMetric>>,
    }

    impl TestSink {
        fn new() -> Self {
            TestSink {
                metrics: Mutex::new(Vec::new()),
            }
        }

        fn take_metrics(&self) -> Vec<CacheMetric> {
            std::mem::take(&mut *self.metrics.lock().unwrap())
        }
    }

    #[async_trait]
    impl MetricsSink for TestSink {
        fn emit(&self, metric: CacheMetric) {
            self.metrics.lock().unwrap().push(metric);
        }

        async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    fn entry() -> RawEntry {
        RawEntry::from_document("key1", &serde_json::Map::new()).unwrap()
    }

    #[tokio::test]
    async fn test_open_and_read_miss() {
        let inner: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let sink = Arc::new(TestSink::new());
        let store = MetricsStore::new(inner, sink.clone());

        let handle = store.open("app").await.unwrap();
        let result = handle.get("key1").await.unwrap();
        assert!(result.is_none());

        let metrics = sink.take_metrics();
        assert_eq!(metrics.len(), 2);

        match &metrics[0] {
            CacheMetric::Open {
                cache_id,
                available,
                store,
                latency_ms,
            } => {
                assert_eq!(cache_id, "app");
                assert!(available);
                assert_eq!(store, "hashmap");
                assert!(*latency_ms >= 0.0);
            }
            _ => panic!("Expected Open metric"),
        }

        match &metrics[1] {
            CacheMetric::Read {
                key,
                hit,
                store,
                cache_id,
                ..
            } => {
                assert_eq!(key, "key1");
                assert!(!hit);
                assert_eq!(store, "hashmap");
                assert_eq!(cache_id, "app");
            }
            _ => panic!("Expected Read metric"),
        }
    }

    #[tokio::test]
    async fn test_write_then_read_hit() {
        let inner: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let sink = Arc::new(TestSink::new());
        let store = MetricsStore::new(inner, sink.clone());

        let handle = store.open("app").await.unwrap();
        handle.put("key1", entry()).await.unwrap();
        handle.get("key1").await.unwrap();

        let metrics = sink.take_metrics();
        assert_eq!(metrics.len(), 3);
        assert!(matches!(
            &metrics[1],
            CacheMetric::Write { key, success: true, .. } if key == "key1"
        ));
        assert!(matches!(&metrics[2], CacheMetric::Read { hit: true, .. }));
    }

    #[tokio::test]
    async fn test_unavailable_open_is_recorded() {
        let sink = Arc::new(TestSink::new());
        let store = MetricsStore::new(Arc::new(DisabledStore), sink.clone());

        assert!(store.open("app").await.is_err());

        let metrics = sink.take_metrics();
        assert_eq!(metrics.len(), 1);
        match &metrics[0] {
            CacheMetric::Open {
                available, store, ..
            } => {
                assert!(!available);
                assert_eq!(store, "disabled");
            }
            _ => panic!("Expected Open metric"),
        }
    }
}
