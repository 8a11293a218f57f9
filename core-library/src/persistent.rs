//! Persistent cache store
//!
//! Typed, best-effort layer over the host's [`PersistentStore`]. Every
//! collection is kept as one JSON `{ data, timestamp }` entry under a fixed
//! key. Read failures and corrupt JSON are reported as a miss; write failures
//! are logged and swallowed, so callers never branch on storage health.

use bridge_traits::storage::PersistentStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SONGS_KEY: &str = "music_app_songs";
pub const ARTISTS_KEY: &str = "music_app_artists";
pub const GENRES_KEY: &str = "music_app_genres";
pub const PLAYLISTS_KEY: &str = "music_app_playlists";
pub const RECENTLY_PLAYED_KEY: &str = "music_app_recently_played";
pub const LIBRARY_SNAPSHOT_KEY: &str = "music_library_data";

/// Every key the core writes. Logout removes all of them.
pub const ALL_KEYS: &[&str] = &[
    SONGS_KEY,
    ARTISTS_KEY,
    GENRES_KEY,
    PLAYLISTS_KEY,
    RECENTLY_PLAYED_KEY,
    LIBRARY_SNAPSHOT_KEY,
];

/// A persisted collection and the time it was written (epoch ms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: Vec<T>,
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct PersistentCache {
    store: Arc<dyn PersistentStore>,
}

impl PersistentCache {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Read and decode the value under `key`.
    pub fn load_value<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "Persistent read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "Corrupt persistent entry, treating as miss");
                None
            }
        }
    }

    pub fn save_value<V: Serialize + ?Sized>(&self, key: &str, value: &V) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(key, error = %err, "Failed to encode persistent entry");
                return;
            }
        };

        if let Err(err) = self.store.set(key, &json) {
            warn!(key, error = %err, "Persistent write failed");
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        self.load_value(key)
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &[T], timestamp: i64) {
        #[derive(Serialize)]
        struct EntryRef<'a, T> {
            data: &'a [T],
            timestamp: i64,
        }

        self.save_value(key, &EntryRef { data, timestamp });
    }

    pub fn delete(&self, key: &str) {
        if let Err(err) = self.store.delete(key) {
            warn!(key, error = %err, "Persistent delete failed");
        }
    }

    /// Remove every key in `keys`.
    pub fn clear(&self, keys: &[&str]) {
        for key in keys {
            self.delete(key);
        }
        debug!(count = keys.len(), "Persistent entries cleared");
    }
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache").finish_non_exhaustive()
    }
}
