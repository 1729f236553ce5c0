//! Store implementations for the cache library.

pub mod disabled;
pub mod memory;
pub mod metrics;
pub mod moka;
pub mod redis;

pub use disabled::DisabledStore;
pub use memory::{HashMapStore, HashMapStoreConfig};
pub use metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use moka::{MokaStore, MokaStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
