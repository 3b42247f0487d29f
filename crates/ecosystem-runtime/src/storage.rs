//! # In-Memory Storage Service
//!
//! Default `storage` container registration. Persistence formats are out of
//! scope for the kernel, so the ambient storage service is a process-local
//! key/value map with the interface modules expect.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// Process-local key/value storage shared through the container.
#[derive(Default)]
pub struct InMemoryStorage {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `key`.
    pub fn set(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
    }

    /// Read `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Delete `key`, returning whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.values.write().remove(key).is_some()
    }

    /// Delete everything.
    pub fn clear(&self) {
        self.values.write().clear();
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}
