//! Library snapshot cache
//!
//! The user's library view (liked songs, followed artists, play history) is
//! persisted as one entry with its own, longer TTL. An expired entry is
//! deleted on read.

use bridge_traits::time::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::models::{Artist, Song};
use crate::persistent::{PersistentCache, LIBRARY_SNAPSHOT_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    /// Epoch ms when the snapshot was assembled
    pub timestamp: i64,
    pub liked_songs: Vec<Song>,
    pub favorite_artists: Vec<Artist>,
    pub recently_played: Vec<Song>,
}

pub struct LibrarySnapshotCache {
    persistent: PersistentCache,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl LibrarySnapshotCache {
    pub fn new(persistent: PersistentCache, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            persistent,
            clock,
            ttl,
        }
    }

    /// The stored snapshot, if present and younger than the TTL.
    pub fn load(&self) -> Option<LibrarySnapshot> {
        let snapshot: LibrarySnapshot = self.persistent.load_value(LIBRARY_SNAPSHOT_KEY)?;

        let age = self.clock.unix_timestamp_millis() - snapshot.timestamp;
        if age >= self.ttl.as_millis() as i64 {
            debug!(age_ms = age, "Library snapshot expired");
            self.clear();
            return None;
        }

        Some(snapshot)
    }

    pub fn save(&self, snapshot: &LibrarySnapshot) {
        self.persistent.save_value(LIBRARY_SNAPSHOT_KEY, snapshot);
    }

    pub fn clear(&self) {
        self.persistent.delete(LIBRARY_SNAPSHOT_KEY);
    }

    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::storage::{InMemoryStore, PersistentStore};
    use bridge_traits::time::ManualClock;

    fn snapshot(timestamp: i64) -> LibrarySnapshot {
        LibrarySnapshot {
            timestamp,
            liked_songs: Vec::new(),
            favorite_artists: Vec::new(),
            recently_played: Vec::new(),
        }
    }

    #[test]
    fn test_fresh_snapshot_is_returned() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::at_millis(10_000));
        let cache = LibrarySnapshotCache::new(
            PersistentCache::new(store),
            clock.clone(),
            Duration::from_secs(300),
        );

        cache.save(&snapshot(10_000));
        clock.advance(chrono::Duration::seconds(299));

        assert_eq!(cache.load(), Some(snapshot(10_000)));
    }

    #[test]
    fn test_expired_snapshot_is_deleted() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::at_millis(0));
        let cache = LibrarySnapshotCache::new(
            PersistentCache::new(store.clone()),
            clock.clone(),
            Duration::from_secs(300),
        );

        cache.save(&snapshot(0));
        clock.advance(chrono::Duration::minutes(5));

        assert!(cache.load().is_none());
        assert!(store.get(LIBRARY_SNAPSHOT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_none() {
        let store = Arc::new(InMemoryStore::new());
        store.set(LIBRARY_SNAPSHOT_KEY, "[1, 2").unwrap();

        let cache = LibrarySnapshotCache::new(
            PersistentCache::new(store),
            Arc::new(ManualClock::at_millis(0)),
            Duration::from_secs(300),
        );
        assert!(cache.load().is_none());
    }
}
