//! Runtime request cache for repository lookups
//!
//! Keyed by the exact endpoint URL. The cache lives as long as its owner and
//! is shared between concurrent lookups through an `Arc`.

use dashmap::DashMap;
use serde_json::Value;

/// In-memory cache of parsed API responses
#[derive(Debug, Default)]
pub struct RuntimeCache {
    entries: DashMap<String, Value>,
}

impl RuntimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
