//! Shared fakes for the core-library integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::catalog::{CatalogSource, RawArtist, RawGenre, RawPlaylist, RawSong};
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::InMemoryStore;
use bridge_traits::time::ManualClock;
use core_library::CatalogCache;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn raw_artist(id: u64, favorite: bool) -> RawArtist {
    RawArtist {
        id,
        name: format!("Artist {}", id),
        image: String::new(),
        followers: Some(id),
        is_favorite: favorite,
    }
}

pub fn raw_playlist(id: u64) -> RawPlaylist {
    RawPlaylist {
        id,
        name: format!("Playlist {}", id),
        description: None,
        image: String::new(),
        is_hero_slide: false,
        is_featured: false,
        is_profile: false,
    }
}

pub fn raw_song(id: u64, artist_id: u64, playlist_id: u64) -> RawSong {
    RawSong {
        id,
        title: format!("Song {}", id),
        album: "Album".to_string(),
        duration: 180 + id,
        cover: String::new(),
        audio: format!("https://cdn.example/{}.mp3", id),
        artist: raw_artist(artist_id, false),
        genre: RawGenre {
            id: 1,
            name: "Pop".to_string(),
            image: None,
        },
        playlist: raw_playlist(playlist_id),
        is_trending: false,
        is_new_release: false,
        is_top_chart: false,
        is_liked: false,
        is_recently_played: false,
        last_played_at: None,
    }
}

/// In-process backend. Every list call takes `delay` and honors
/// cancellation.
#[derive(Default)]
pub struct FakeCatalog {
    pub songs: Mutex<Vec<RawSong>>,
    pub artists: Mutex<Vec<RawArtist>>,
    pub genres: Mutex<Vec<RawGenre>>,
    pub playlists: Mutex<Vec<RawPlaylist>>,
    pub recently_played: Mutex<Vec<RawSong>>,

    pub song_calls: AtomicUsize,
    pub artist_calls: AtomicUsize,
    pub playlist_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,

    pub fail_lists: AtomicBool,
    pub fail_songs: AtomicBool,
    pub fail_actions: AtomicBool,
    pub delay: Mutex<Duration>,

    pub actions: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_songs(songs: Vec<RawSong>) -> Arc<Self> {
        let catalog = Self::default();
        *catalog.songs.lock() = songs;
        Arc::new(catalog)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn song_calls(&self) -> usize {
        self.song_calls.load(Ordering::SeqCst)
    }

    async fn respond<T: Clone>(
        &self,
        counter: &AtomicUsize,
        data: &Mutex<Vec<T>>,
        cancel: CancellationToken,
    ) -> Result<Vec<T>> {
        counter.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();

        tokio::select! {
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(BridgeError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(data.lock().clone())
    }

    fn act(&self, action: String) -> Result<()> {
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(format!("{} rejected", action)));
        }
        self.actions.lock().push(action);
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_songs(&self, cancel: CancellationToken) -> Result<Vec<RawSong>> {
        if self.fail_songs.load(Ordering::SeqCst) {
            self.song_calls.fetch_add(1, Ordering::SeqCst);
            return Err(BridgeError::OperationFailed("connection reset".to_string()));
        }
        self.respond(&self.song_calls, &self.songs, cancel).await
    }

    async fn list_artists(&self, cancel: CancellationToken) -> Result<Vec<RawArtist>> {
        self.respond(&self.artist_calls, &self.artists, cancel).await
    }

    async fn list_genres(&self, cancel: CancellationToken) -> Result<Vec<RawGenre>> {
        let unused = AtomicUsize::new(0);
        self.respond(&unused, &self.genres, cancel).await
    }

    async fn list_playlists(&self, cancel: CancellationToken) -> Result<Vec<RawPlaylist>> {
        self.respond(&self.playlist_calls, &self.playlists, cancel).await
    }

    async fn list_recently_played(&self, cancel: CancellationToken) -> Result<Vec<RawSong>> {
        self.respond(&self.recent_calls, &self.recently_played, cancel)
            .await
    }

    async fn record_play(&self, song_id: u64) -> Result<()> {
        self.act(format!("play:{}", song_id))
    }

    async fn set_liked(&self, song_id: u64, liked: bool) -> Result<()> {
        self.act(format!("like:{}:{}", song_id, liked))
    }

    async fn set_recently_played(&self, song_id: u64) -> Result<()> {
        self.act(format!("recent:{}", song_id))
    }

    async fn set_favorite(&self, artist_id: u64, favorite: bool) -> Result<()> {
        self.act(format!("favorite:{}:{}", artist_id, favorite))
    }
}

pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<CatalogCache>,
}

pub fn harness(catalog: Arc<FakeCatalog>) -> Harness {
    harness_with_store(catalog, Arc::new(InMemoryStore::new()))
}

pub fn harness_with_store(catalog: Arc<FakeCatalog>, store: Arc<InMemoryStore>) -> Harness {
    let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
    let cache = Arc::new(CatalogCache::new(
        catalog.clone(),
        store.clone(),
        clock.clone(),
        Duration::from_secs(60),
        None,
    ));

    Harness {
        catalog,
        store,
        clock,
        cache,
    }
}
