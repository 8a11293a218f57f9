//! Persistent Key-Value Storage
//!
//! Durable string storage used as the offline fallback for cached
//! collections. Values are opaque to the store; callers serialize to JSON.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::Result;

/// Persistent key-value store trait
///
/// Abstracts the host's durable storage:
/// - Desktop: one JSON file per key under the app data directory
/// - Web: localStorage
/// - Tests: [`InMemoryStore`]
///
/// Operations are synchronous. Any of them may fail (quota, permissions,
/// corrupt media); callers are expected to degrade to a cache miss rather
/// than surface the error.
pub trait PersistentStore: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// List every key currently held by the store.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Process-local store backed by a `HashMap`.
///
/// Useful for tests and for hosts that do not need durability.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
