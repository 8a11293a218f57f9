//! Integration tests for the playback session
//!
//! These tests verify:
//! - Queue replacement and index clamping
//! - Transport commands and rejected playback
//! - Next/prev with shuffle and repeat modes
//! - Media event handling and the event pump
//! - Observer notification counts

use async_trait::async_trait;
use bridge_desktop::SilentMediaElement;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{MediaElement, MediaEvent};
use core_library::models::{Artist, ArtistId, Genre, GenreId, PlaylistId, PlaylistRef, Song, SongId};
use core_playback::{
    spawn_media_event_pump, PlayOutcome, PlaybackSession, PlaybackSnapshot, RepeatMode,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

fn song(id: u64) -> Song {
    Song {
        id: SongId(id),
        title: format!("Song {}", id),
        artist: Artist {
            id: ArtistId(1),
            name: "Artist".to_string(),
            image: String::new(),
            followers: None,
            is_favorite: false,
        },
        album: "Album".to_string(),
        duration: "3:00".to_string(),
        cover: String::new(),
        audio: format!("https://cdn.example/{}.mp3", id),
        playlist: PlaylistRef {
            id: PlaylistId(1),
            name: "Mix".to_string(),
            description: None,
            image: String::new(),
            is_hero_slide: false,
            is_featured: false,
            is_profile: false,
        },
        genre: Genre {
            id: GenreId(1),
            name: "Pop".to_string(),
            image: None,
        },
        is_liked: false,
        is_recently_played: false,
        is_trending: false,
        is_new_release: false,
        is_top_chart: false,
        last_played_at: None,
    }
}

fn songs(count: u64) -> Vec<Song> {
    (1..=count).map(song).collect()
}

#[derive(Default)]
struct FakeTransport {
    source: Option<String>,
    current_time: f64,
    duration: f64,
    volume: f64,
}

/// Media element with a controllable `play()` result.
#[derive(Default)]
struct FakeMedia {
    transport: Mutex<FakeTransport>,
    reject_play: AtomicBool,
    /// Next `play()` rejects after this delay
    slow_rejection: Mutex<Option<Duration>>,
    play_calls: AtomicUsize,
    load_calls: AtomicUsize,
}

impl FakeMedia {
    fn set_duration(&self, seconds: f64) {
        self.transport.lock().duration = seconds;
    }
}

#[async_trait]
impl MediaElement for FakeMedia {
    fn set_source(&self, url: Option<&str>) {
        self.transport.lock().source = url.map(str::to_string);
    }

    fn source(&self) -> Option<String> {
        self.transport.lock().source.clone()
    }

    fn current_time(&self) -> f64 {
        self.transport.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.transport.lock().current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.transport.lock().duration
    }

    fn volume(&self) -> f64 {
        self.transport.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.transport.lock().volume = volume;
    }

    fn load(&self) {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.transport.lock().current_time = 0.0;
    }

    async fn play(&self) -> BridgeResult<()> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        let slow_rejection = self.slow_rejection.lock().take();
        if let Some(delay) = slow_rejection {
            tokio::time::sleep(delay).await;
            return Err(BridgeError::OperationFailed(
                "interrupted by a new load".to_string(),
            ));
        }
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "autoplay blocked".to_string(),
            ));
        }
        Ok(())
    }

    fn pause(&self) {}
}

struct Fixture {
    media: Arc<FakeMedia>,
    session: PlaybackSession,
    seen: Arc<Mutex<Vec<PlaybackSnapshot>>>,
    _subscription: core_playback::Subscription,
}

impl Fixture {
    fn notifications(&self) -> usize {
        self.seen.lock().len()
    }

    fn last(&self) -> PlaybackSnapshot {
        self.seen.lock().last().cloned().unwrap()
    }
}

fn fixture() -> Fixture {
    let media = Arc::new(FakeMedia::default());
    let session = PlaybackSession::new(media.clone(), 0.75);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscription = {
        let seen = seen.clone();
        session.subscribe(move |snapshot| seen.lock().push(snapshot.clone()))
    };

    Fixture {
        media,
        session,
        seen,
        _subscription: subscription,
    }
}

// ============================================================================
// Queue
// ============================================================================

#[test]
fn test_new_session_applies_initial_volume() {
    let f = fixture();
    assert_eq!(f.media.volume(), 0.75);

    let state = f.session.get_state();
    assert!(state.queue.is_empty());
    assert_eq!(state.current_index, None);
    assert!(!state.is_playing);
    assert_eq!(state.repeat, RepeatMode::Off);
}

#[test]
fn test_set_queue_clamps_start_index_and_does_not_autoplay() {
    let f = fixture();
    f.session.set_queue(songs(3), 10);

    let state = f.session.get_state();
    assert_eq!(state.current_index, Some(2));
    assert!(!state.is_playing);
    assert_eq!(
        f.media.source().as_deref(),
        Some("https://cdn.example/3.mp3")
    );
    assert_eq!(f.media.play_calls.load(Ordering::SeqCst), 0);
    assert_eq!(f.notifications(), 1);
}

#[tokio::test]
async fn test_empty_queue_returns_to_idle() {
    let f = fixture();
    f.session.set_queue(songs(2), 0);
    assert!(f.session.play().await.is_started());

    f.session.set_queue(Vec::new(), 0);
    let state = f.session.get_state();
    assert_eq!(state.current_index, None);
    assert!(!state.is_playing);
    assert!(f.media.source().is_none());

    assert_eq!(f.session.play().await, PlayOutcome::NothingToPlay);
    assert_eq!(f.session.next().await, PlayOutcome::NothingToPlay);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_play_and_pause_notify_once_each() {
    let f = fixture();
    f.session.set_queue(songs(2), 0);

    assert_eq!(f.session.play().await, PlayOutcome::Started);
    assert_eq!(f.notifications(), 2);
    assert!(f.last().is_playing);

    f.session.pause();
    assert_eq!(f.notifications(), 3);
    assert!(!f.last().is_playing);
}

#[tokio::test]
async fn test_rejected_play_reverts_is_playing() {
    let f = fixture();
    f.session.set_queue(songs(2), 0);
    f.media.reject_play.store(true, Ordering::SeqCst);

    let outcome = f.session.play().await;

    assert!(matches!(outcome, PlayOutcome::Rejected { ref reason } if reason.contains("autoplay blocked")));
    assert!(!f.session.get_state().is_playing);

    let seen: Vec<bool> = f.seen.lock().iter().map(|s| s.is_playing).collect();
    assert_eq!(seen, vec![false, true, false]);
}

#[tokio::test]
async fn test_late_rejection_of_replaced_track_is_ignored() {
    let media = Arc::new(FakeMedia::default());
    let session = Arc::new(PlaybackSession::new(media.clone(), 0.75));
    session.set_queue(songs(3), 0);

    *media.slow_rejection.lock() = Some(Duration::from_millis(100));
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.play().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(session.next().await, PlayOutcome::Started);

    let outcome = first.await.unwrap();
    assert!(matches!(outcome, PlayOutcome::Rejected { .. }));

    let state = session.get_state();
    assert_eq!(state.current_index, Some(1));
    assert!(state.is_playing);
}

#[tokio::test]
async fn test_toggle_play() {
    let f = fixture();
    f.session.set_queue(songs(2), 0);

    assert_eq!(f.session.toggle_play().await, PlayOutcome::Started);
    assert_eq!(f.session.toggle_play().await, PlayOutcome::Paused);
    assert!(!f.session.get_state().is_playing);
}

#[tokio::test]
async fn test_play_track_at_index() {
    let f = fixture();
    f.session.set_queue(songs(3), 0);

    let outcome = f.session.play_track_at_index(2).await;
    assert!(outcome.is_started());
    assert_eq!(f.session.get_state().current_index, Some(2));
    assert_eq!(
        f.media.source().as_deref(),
        Some("https://cdn.example/3.mp3")
    );

    let before = f.notifications();
    let outcome = f.session.play_track_at_index(3).await;
    assert_eq!(outcome, PlayOutcome::NothingToPlay);
    assert_eq!(f.session.get_state().current_index, Some(2));
    assert_eq!(f.notifications(), before);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_next_stops_at_end_with_repeat_off() {
    let f = fixture();
    f.session.set_queue(songs(2), 1);
    let before = f.notifications();

    assert_eq!(f.session.next().await, PlayOutcome::NothingToPlay);
    assert_eq!(f.session.get_state().current_index, Some(1));
    assert_eq!(f.notifications(), before);
}

#[tokio::test]
async fn test_next_wraps_with_repeat_all() {
    let f = fixture();
    f.session.set_queue(songs(3), 2);
    assert_eq!(f.session.cycle_repeat(), RepeatMode::All);

    assert!(f.session.next().await.is_started());
    let state = f.session.get_state();
    assert_eq!(state.current_index, Some(0));
    assert!(state.is_playing);
}

#[tokio::test]
async fn test_next_notifies_once_and_loads_source() {
    let f = fixture();
    f.session.set_queue(songs(3), 0);
    let before = f.notifications();
    let loads = f.media.load_calls.load(Ordering::SeqCst);

    f.session.next().await;

    assert_eq!(f.notifications(), before + 1);
    assert_eq!(f.media.load_calls.load(Ordering::SeqCst), loads + 1);
    assert_eq!(
        f.media.source().as_deref(),
        Some("https://cdn.example/2.mp3")
    );
}

#[tokio::test]
async fn test_prev_at_start() {
    let f = fixture();
    f.session.set_queue(songs(3), 0);

    assert!(f.session.prev().await.is_started());
    assert_eq!(f.session.get_state().current_index, Some(0));

    f.session.cycle_repeat();
    f.session.prev().await;
    assert_eq!(f.session.get_state().current_index, Some(2));

    f.session.prev().await;
    assert_eq!(f.session.get_state().current_index, Some(1));
}

#[tokio::test]
async fn test_shuffle_never_repeats_current_track() {
    let f = fixture();
    f.session.set_queue(songs(4), 0);
    f.session.toggle_shuffle();
    assert!(f.session.get_state().shuffle);

    for _ in 0..50 {
        let before = f.session.get_state().current_index;
        f.session.next().await;
        assert_ne!(f.session.get_state().current_index, before);

        let before = f.session.get_state().current_index;
        f.session.prev().await;
        assert_ne!(f.session.get_state().current_index, before);
    }
}

#[tokio::test]
async fn test_shuffle_with_single_track_is_noop() {
    let f = fixture();
    f.session.set_queue(songs(1), 0);
    f.session.toggle_shuffle();

    assert_eq!(f.session.next().await, PlayOutcome::NothingToPlay);
    assert_eq!(f.session.prev().await, PlayOutcome::NothingToPlay);
    assert_eq!(f.session.get_state().current_index, Some(0));
}

#[test]
fn test_cycle_repeat_notifies() {
    let f = fixture();
    assert_eq!(f.session.cycle_repeat(), RepeatMode::All);
    assert_eq!(f.session.cycle_repeat(), RepeatMode::One);
    assert_eq!(f.session.cycle_repeat(), RepeatMode::Off);
    assert_eq!(f.notifications(), 3);
}

// ============================================================================
// Seek & Volume
// ============================================================================

#[test]
fn test_seek_ignored_while_duration_unknown() {
    let f = fixture();
    f.session.set_queue(songs(1), 0);
    f.media.set_duration(f64::NAN);
    let before = f.notifications();

    f.session.seek_to(0.5);

    assert_eq!(f.media.current_time(), 0.0);
    assert_eq!(f.notifications(), before);
}

#[test]
fn test_seek_clamps_percent() {
    let f = fixture();
    f.session.set_queue(songs(1), 0);
    f.media.set_duration(200.0);

    f.session.seek_to(0.25);
    assert_eq!(f.media.current_time(), 50.0);
    assert_eq!(f.last().current_time, 50.0);
    assert_eq!(f.last().progress(), 0.25);

    f.session.seek_to(1.5);
    assert_eq!(f.media.current_time(), 200.0);

    f.session.seek_to(-1.0);
    assert_eq!(f.media.current_time(), 0.0);
}

#[test]
fn test_set_volume_clamps_and_ignores_nan() {
    let f = fixture();

    f.session.set_volume(1.7);
    assert_eq!(f.session.get_state().volume, 1.0);
    assert_eq!(f.media.volume(), 1.0);

    f.session.set_volume(-0.2);
    assert_eq!(f.session.get_state().volume, 0.0);

    let before = f.notifications();
    f.session.set_volume(f64::NAN);
    assert_eq!(f.session.get_state().volume, 0.0);
    assert_eq!(f.notifications(), before);
}

// ============================================================================
// Media Events
// ============================================================================

#[tokio::test]
async fn test_ended_advances_to_next_track() {
    let f = fixture();
    f.session.set_queue(songs(3), 0);
    f.session.play().await;

    f.session.handle_media_event(MediaEvent::Ended).await;

    let state = f.session.get_state();
    assert_eq!(state.current_index, Some(1));
    assert!(state.is_playing);
}

#[tokio::test]
async fn test_ended_at_end_of_queue_stops() {
    let f = fixture();
    f.session.set_queue(songs(2), 1);
    f.session.play().await;

    f.session.handle_media_event(MediaEvent::Ended).await;

    let state = f.session.get_state();
    assert_eq!(state.current_index, Some(1));
    assert!(!state.is_playing);
}

#[tokio::test]
async fn test_ended_with_repeat_one_restarts_track() {
    let f = fixture();
    f.session.set_queue(songs(3), 1);
    f.session.cycle_repeat();
    f.session.cycle_repeat();
    f.session.play().await;
    f.media.set_current_time(180.0);
    let plays = f.media.play_calls.load(Ordering::SeqCst);

    f.session.handle_media_event(MediaEvent::Ended).await;

    let state = f.session.get_state();
    assert_eq!(state.current_index, Some(1));
    assert!(state.is_playing);
    assert_eq!(f.media.current_time(), 0.0);
    assert_eq!(f.media.play_calls.load(Ordering::SeqCst), plays + 1);
}

#[tokio::test]
async fn test_external_play_pause_sync_state() {
    let f = fixture();
    f.session.set_queue(songs(1), 0);
    let before = f.notifications();

    f.session.handle_media_event(MediaEvent::Play).await;
    assert!(f.session.get_state().is_playing);
    f.session.handle_media_event(MediaEvent::Play).await;
    assert_eq!(f.notifications(), before + 1);

    f.session.handle_media_event(MediaEvent::Pause).await;
    assert!(!f.session.get_state().is_playing);
}

#[tokio::test]
async fn test_media_error_stops_playback() {
    let f = fixture();
    f.session.set_queue(songs(1), 0);
    f.session.play().await;

    f.session
        .handle_media_event(MediaEvent::Error {
            message: "decode failed".to_string(),
        })
        .await;

    assert!(!f.session.get_state().is_playing);
}

#[tokio::test]
async fn test_time_update_notifies() {
    let f = fixture();
    let before = f.notifications();
    f.session.handle_media_event(MediaEvent::TimeUpdate).await;
    f.session.handle_media_event(MediaEvent::LoadedMetadata).await;
    assert_eq!(f.notifications(), before + 2);
}

// ============================================================================
// Observers & Events
// ============================================================================

#[test]
fn test_dropped_subscription_stops_notifications() {
    let media = Arc::new(FakeMedia::default());
    let session = PlaybackSession::new(media, 0.5);
    let calls = Arc::new(AtomicUsize::new(0));

    let subscription = {
        let calls = calls.clone();
        session.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };
    session.toggle_shuffle();
    drop(subscription);
    session.toggle_shuffle();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transitions_are_published_on_event_bus() {
    let bus = EventBus::new(32);
    let mut rx = bus.subscribe();
    let media = Arc::new(FakeMedia::default());
    let session = PlaybackSession::new(media.clone(), 0.75).with_events(bus);

    session.set_queue(songs(2), 0);
    session.play().await;
    media.reject_play.store(true, Ordering::SeqCst);
    session.next().await;

    let mut events = Vec::new();
    while let Ok(CoreEvent::Playback(event)) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        events[0],
        PlaybackEvent::QueueReplaced {
            length: 2,
            current_index: Some(0)
        }
    ));
    assert!(matches!(events[1], PlaybackEvent::TrackChanged { song_id: 1, index: 0, .. }));
    assert!(matches!(events[2], PlaybackEvent::Started { song_id: 1 }));
    assert!(matches!(events[3], PlaybackEvent::TrackChanged { song_id: 2, index: 1, .. }));
    assert!(matches!(
        events[4],
        PlaybackEvent::Error {
            song_id: Some(2),
            ..
        }
    ));
}

// ============================================================================
// Event Pump
// ============================================================================

async fn wait_for<F>(session: &PlaybackSession, predicate: F)
where
    F: Fn(&PlaybackSnapshot) -> bool,
{
    for _ in 0..100 {
        if predicate(&session.get_state()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached expected state");
}

#[tokio::test]
async fn test_event_pump_advances_on_ended() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let media = Arc::new(SilentMediaElement::new().with_events(tx));
    let session = Arc::new(PlaybackSession::new(media.clone(), 0.75));
    let pump = spawn_media_event_pump(session.clone(), rx);

    session.set_queue(songs(2), 0);
    assert!(session.play().await.is_started());
    assert!(media.is_playing());

    media.finish();
    wait_for(&session, |state| state.current_index == Some(1)).await;
    assert!(media.is_playing());

    media.finish();
    wait_for(&session, |state| !state.is_playing).await;
    assert_eq!(session.get_state().current_index, Some(1));

    pump.abort();
}
