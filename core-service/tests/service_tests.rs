//! End-to-end tests for the core service
//!
//! These tests verify:
//! - Catalog fetch feeding the playback session
//! - Media events flowing through the attached pump
//! - Logout wiping every persisted key
//! - Event bus publication across components

use async_trait::async_trait;
use bridge_desktop::SilentMediaElement;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    CatalogSource, InMemoryStore, PersistentStore, RawArtist, RawGenre, RawPlaylist, RawSong,
};
use core_library::persistent::{ALL_KEYS, SONGS_KEY};
use core_library::{FetchOptions, SongId};
use core_playback::PlayOutcome;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CacheEvent, CoreEvent, LibraryEvent};
use core_service::{CoreError, CoreService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn raw_song(id: u64) -> RawSong {
    RawSong {
        id,
        title: format!("Song {}", id),
        album: "Album".to_string(),
        duration: 200,
        cover: String::new(),
        audio: format!("https://cdn.example/{}.mp3", id),
        artist: RawArtist {
            id: 1,
            name: "Artist".to_string(),
            image: String::new(),
            followers: Some(2),
            is_favorite: false,
        },
        genre: RawGenre {
            id: 1,
            name: "Pop".to_string(),
            image: None,
        },
        playlist: RawPlaylist {
            id: 1,
            name: "Mix".to_string(),
            description: None,
            image: String::new(),
            is_hero_slide: false,
            is_featured: false,
            is_profile: false,
        },
        is_trending: false,
        is_new_release: false,
        is_top_chart: false,
        is_liked: false,
        is_recently_played: false,
        last_played_at: None,
    }
}

#[derive(Default)]
struct StaticCatalog {
    song_calls: AtomicUsize,
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_songs(&self, _: CancellationToken) -> BridgeResult<Vec<RawSong>> {
        self.song_calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=3).map(raw_song).collect())
    }

    async fn list_artists(&self, _: CancellationToken) -> BridgeResult<Vec<RawArtist>> {
        Ok(vec![raw_song(1).artist])
    }

    async fn list_genres(&self, _: CancellationToken) -> BridgeResult<Vec<RawGenre>> {
        Ok(vec![raw_song(1).genre])
    }

    async fn list_playlists(&self, _: CancellationToken) -> BridgeResult<Vec<RawPlaylist>> {
        Ok(vec![raw_song(1).playlist])
    }

    async fn list_recently_played(&self, _: CancellationToken) -> BridgeResult<Vec<RawSong>> {
        Ok(vec![raw_song(2)])
    }

    async fn record_play(&self, _: u64) -> BridgeResult<()> {
        Ok(())
    }

    async fn set_liked(&self, _: u64, _: bool) -> BridgeResult<()> {
        Ok(())
    }

    async fn set_recently_played(&self, _: u64) -> BridgeResult<()> {
        Ok(())
    }

    async fn set_favorite(&self, _: u64, _: bool) -> BridgeResult<()> {
        Ok(())
    }
}

struct Harness {
    catalog: Arc<StaticCatalog>,
    store: Arc<InMemoryStore>,
    media: Arc<SilentMediaElement>,
    core: CoreService,
}

fn harness() -> (Harness, tokio::sync::mpsc::UnboundedReceiver<bridge_traits::MediaEvent>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let catalog = Arc::new(StaticCatalog::default());
    let store = Arc::new(InMemoryStore::new());
    let media = Arc::new(SilentMediaElement::new().with_events(tx));

    let config = CoreConfig::builder()
        .catalog_source(catalog.clone())
        .persistent_store(store.clone())
        .media_element(media.clone())
        .initial_volume(0.5)
        .build()
        .unwrap();

    let core = CoreService::new(config).unwrap();
    (
        Harness {
            catalog,
            store,
            media,
            core,
        },
        rx,
    )
}

#[tokio::test]
async fn test_fetch_queue_and_navigate() {
    let (h, _rx) = harness();
    let playback = h.core.playback();

    let songs = h.core.catalog().songs(FetchOptions::default()).await.unwrap();
    assert_eq!(songs.len(), 3);

    playback.set_queue(songs.to_vec(), 1);
    assert_eq!(playback.play().await, PlayOutcome::Started);

    playback.next().await;
    let state = playback.get_state();
    assert_eq!(state.current_index, Some(2));
    assert!(state.is_playing);

    assert_eq!(playback.next().await, PlayOutcome::NothingToPlay);
    let state = playback.get_state();
    assert_eq!(state.current_index, Some(2));
    assert!(state.is_playing);
    assert_eq!(state.volume, 0.5);
}

#[tokio::test]
async fn test_attached_pump_handles_track_end() {
    let (h, rx) = harness();
    h.core.attach_media_events(rx).unwrap();
    let playback = h.core.playback();

    let songs = h.core.catalog().songs(FetchOptions::default()).await.unwrap();
    playback.set_queue(songs.to_vec(), 0);
    playback.play().await;

    h.media.finish();
    for _ in 0..100 {
        if playback.get_state().current_index == Some(1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(playback.get_state().current_index, Some(1));

    h.core.shutdown();
    assert!(!playback.get_state().is_playing);
}

#[test]
fn test_attach_without_runtime_fails() {
    let (h, rx) = harness();
    let err = h.core.attach_media_events(rx).unwrap_err();
    assert!(matches!(err, CoreError::InitializationFailed(_)));
}

#[tokio::test]
async fn test_logout_wipes_persisted_state() {
    let (h, _rx) = harness();
    let catalog = h.core.catalog();
    let library = h.core.library();

    library.load_snapshot(FetchOptions::default()).await.unwrap();
    catalog.genres(FetchOptions::default()).await.unwrap();
    catalog.playlists(FetchOptions::default()).await.unwrap();
    assert!(h.store.get(SONGS_KEY).unwrap().is_some());

    h.core.playback().set_queue(catalog.songs(FetchOptions::default()).await.unwrap().to_vec(), 0);
    h.core.logout();

    for key in ALL_KEYS {
        assert!(h.store.get(key).unwrap().is_none(), "{} survived logout", key);
    }
    assert!(h.core.playback().get_state().queue.is_empty());

    catalog.songs(FetchOptions::default()).await.unwrap();
    assert_eq!(h.catalog.song_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_components_publish_on_shared_bus() {
    let (h, _rx) = harness();
    let mut events = h.core.subscribe_events();

    h.core.catalog().songs(FetchOptions::default()).await.unwrap();
    assert!(h.core.library().set_song_liked(SongId(1), true).await);

    let mut fetched = false;
    let mut liked = false;
    while let Some(Ok(event)) = events.try_recv() {
        match event {
            CoreEvent::Cache(CacheEvent::Fetched { .. }) => fetched = true,
            CoreEvent::Library(LibraryEvent::SongLikeChanged { song_id: 1, liked: true }) => {
                liked = true
            }
            _ => {}
        }
    }
    assert!(fetched);
    assert!(liked);
}

#[test]
fn test_cancelled_error_classification() {
    let err = CoreError::from(core_library::LibraryError::Cancelled);
    assert!(err.is_cancelled());

    let err = CoreError::InitializationFailed("boom".to_string());
    assert!(!err.is_cancelled());
}
