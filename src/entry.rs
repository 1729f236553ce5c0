use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CacheError;

/// A cached JSON document.
///
/// Field order is preserved, so two documents with the same fields in a
/// different order serialize to different text.
pub type Document = Map<String, Value>;

/// Name of the field every written document carries its cache key in.
pub const CACHE_NAME_FIELD: &str = "cacheName";

/// Content type declared for every stored body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The value a store holds for one key.
///
/// Mirrors an HTTP response: the status line is informational only, the body
/// is the pretty-printed JSON text of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Always `200` for entries written by the cache.
    pub status: u16,
    /// `"cached result for <key>"`.
    pub status_text: String,
    /// Always `application/json`.
    pub content_type: String,
    /// Serialized document.
    pub body: String,
}

impl RawEntry {
    /// Serialize a document into an entry stored under `key`.
    pub fn from_document(key: &str, document: &Document) -> Result<Self, CacheError> {
        let body = serde_json::to_string_pretty(document)
            .map_err(|e| CacheError::Serialization(format!("Serialization failed: {}", e)))?;

        Ok(RawEntry {
            status: 200,
            status_text: format!("cached result for {}", key),
            content_type: JSON_CONTENT_TYPE.to_string(),
            body,
        })
    }

    /// Parse the body back into a document.
    pub fn document(&self) -> Result<Document, CacheError> {
        serde_json::from_str(&self.body)
            .map_err(|e| CacheError::Serialization(format!("Deserialization failed: {}", e)))
    }
}

/// Return a copy of `document` carrying `cacheName = key`.
///
/// An existing `cacheName` field keeps its position and gets the new value,
/// otherwise the field is appended.
pub fn tagged(key: &str, document: &Document) -> Document {
    tag(key, document.clone())
}

/// Set `cacheName = key` on an owned document.
pub fn tag(key: &str, mut document: Document) -> Document {
    document.insert(CACHE_NAME_FIELD.to_string(), Value::String(key.to_string()));
    document
}

/// Convert a fetched value into a document.
///
/// Only JSON objects can be cached.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, CacheError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CacheError::Serialization(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(CacheError::Serialization(format!(
            "Serialization failed: {}",
            e
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
