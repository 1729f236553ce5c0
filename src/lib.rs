//! swr-json-cache - A stale-while-revalidate cache for JSON documents
//!
//! This library lets a caller act on the last cached copy of a document while
//! a fresh copy is fetched, then reconciles the cache with the fresh copy:
//! - Cached copy delivered before the cache is touched again
//! - Writes only when the fresh document differs from the cached one
//! - Batched reads that deliver all cached copies at once
//! - Graceful degrade when no store is available
//!
//! # Example
//!
//! ```ignore
//! use swr_json_cache::{JsonCache, HashMapStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = JsonCache::new(Arc::new(HashMapStore::default()));
//!
//!     let outcome = cache
//!         .fetch("user:123", async { api.get_user(123).await })
//!         .cached(|lookup| async move {
//!             // Render whatever is cached right away
//!             if let Some(user) = lookup.document() {
//!                 render(user);
//!             }
//!         })
//!         .await?;
//!
//!     // Re-render only when the fresh copy differs
//!     if let Some(user) = outcome.document() {
//!         render(user);
//!     }
//! }
//! ```

mod cache;
mod config;
mod entry;
mod error;
mod fetch;
mod locks;
mod store;
pub mod stores;
mod utils;

// Re-export public API
pub use cache::{CacheLookup, JsonCache, Reconciliation};
pub use config::{DEFAULT_CACHE_ID, Equality, JsonCacheConfig};
pub use entry::{CACHE_NAME_FIELD, Document, JSON_CONTENT_TYPE, RawEntry};
pub use error::CacheError;
pub use fetch::{BoxedFetch, CachedBatch, CachedFetch};
pub use store::{Store, StoreHandle};
pub use stores::disabled::DisabledStore;
pub use stores::memory::{HashMapStore, HashMapStoreConfig};
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{RedisStore, RedisStoreConfig};
