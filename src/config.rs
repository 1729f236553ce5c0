//! Configuration for [`JsonCache`](crate::JsonCache).

use serde::Deserialize;

use crate::entry::Document;

/// Default id of the cache documents are stored in.
pub const DEFAULT_CACHE_ID: &str = "swr-json-cache";

/// How a fresh document is compared against the cached copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equality {
    /// Compare the serialized JSON text.
    ///
    /// Field order matters: a document whose fields were reordered counts as
    /// changed and is written again.
    #[default]
    Textual,
    /// Compare values structurally; object field order is ignored.
    Structural,
}

impl Equality {
    /// Whether `fresh` and `cached` count as the same document.
    pub fn same(self, fresh: &Document, cached: &Document) -> bool {
        match self {
            Equality::Textual => {
                match (serde_json::to_string(fresh), serde_json::to_string(cached)) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
            Equality::Structural => fresh == cached,
        }
    }
}

/// Configuration for a [`JsonCache`](crate::JsonCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonCacheConfig {
    /// Id of the cache opened in the store.
    pub cache_id: String,
    /// Change detection used by `check_and_update`.
    pub equality: Equality,
    /// Allow only one `check_and_update` per key at a time.
    pub serialize_per_key: bool,
}

impl Default for JsonCacheConfig {
    fn default() -> Self {
        Self {
            cache_id: DEFAULT_CACHE_ID.to_string(),
            equality: Equality::default(),
            serialize_per_key: true,
        }
    }
}

impl JsonCacheConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache id.
    pub fn with_cache_id(mut self, cache_id: impl Into<String>) -> Self {
        self.cache_id = cache_id.into();
        self
    }

    /// Set the equality used for change detection.
    pub fn with_equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }

    /// Enable or disable per-key serialization of reconciliations.
    pub fn with_serialize_per_key(mut self, enabled: bool) -> Self {
        self.serialize_per_key = enabled;
        self
    }
}
