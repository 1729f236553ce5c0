use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CacheError;
use crate::store::{Store, StoreHandle};

/// A store for environments without any caching facility.
///
/// `open` always fails, so reads report the cache as unavailable and
/// reconciliation hands fresh documents back uncached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

#[async_trait]
impl Store for DisabledStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn open(&self, cache_id: &str) -> Result<Arc<dyn StoreHandle>, CacheError> {
        Err(CacheError::unavailable(
            self.name(),
            format!("no caching facility for cache '{}'", cache_id),
        ))
    }
}
