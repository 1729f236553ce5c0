//! Shared utilities for the cache library.

/// Build a composite store key from cache id and key.
///
/// Format: `{len(cache_id)}:{cache_id}::{key}`. The length prefix fixes where
/// the cache id ends, so no two `(cache_id, key)` pairs share a store key even
/// when either part contains `::`.
pub fn build_cache_key(cache_id: &str, key: &str) -> String {
    format!("{}:{}::{}", cache_id.len(), cache_id, key)
}
