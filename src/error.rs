/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The caching facility could not be opened.
    #[error("[{store}] cache store unavailable: {message}")]
    StoreUnavailable { store: String, message: String },

    /// A store read or write failed after the store was opened.
    #[error("[{store}] cache error for key '{key}': {message}")]
    Operation {
        store: String,
        key: String,
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A batch was built from an unusable collection.
    #[error("invalid batch input: {0}")]
    InvalidBatchInput(String),

    /// The caller's pending fetch failed. The source is the caller's own error.
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        store: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            store: store.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new store-unavailable error.
    pub fn unavailable(store: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::StoreUnavailable {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Whether the error means the store could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable { .. })
    }
}
