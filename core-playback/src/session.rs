//! Playback session engine
//!
//! One [`PlaybackSession`] per process. It owns the media element, the queue
//! and the transport flags, and is the only thing that mutates them.
//!
//! ## Lifecycle
//!
//! ```text
//!  set_queue([])          set_queue(songs, i)        play()
//! ┌──────┐ <──────────── ┌───────────────┐ ─────────> ┌─────────┐
//! │ Idle │               │ Loaded/Paused │            │ Playing │
//! └──────┘ ────────────> └───────────────┘ <───────── └────┬────┘
//!                                 ^            pause()     │ Ended
//!                                 └────── next()/repeat ───┘
//! ```
//!
//! ## Notification contract
//!
//! Every command that changes state notifies each observer exactly once,
//! after the change, with the session lock released. Commands that turn out
//! to be no-ops (empty queue, end of queue with repeat off, out-of-range
//! index) do not notify. A rejected `play()` notifies a second time after
//! reverting `is_playing`.

use bridge_traits::media::{MediaElement, MediaEvent};
use core_library::models::{Song, SongId};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::PlaybackError;
use crate::observers::{ObserverRegistry, Subscription};
use crate::state::{PlayOutcome, PlaybackSnapshot, RepeatMode};

/// Volume applied when the host does not configure one.
pub const DEFAULT_VOLUME: f64 = 0.75;

struct SessionState {
    queue: Arc<[Song]>,
    current_index: Option<usize>,
    is_playing: bool,
    /// Bumped on every source load; a `play()` that settles after a newer
    /// load must not touch state.
    load: u64,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f64,
}

impl SessionState {
    fn current_song(&self) -> Option<&Song> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    /// Random index other than the current one. `None` for queues shorter
    /// than two.
    fn shuffled_index(&self) -> Option<usize> {
        let len = self.queue.len();
        let current = self.current_index?;
        if len <= 1 {
            return None;
        }

        let mut index = rand::thread_rng().gen_range(0..len - 1);
        if index >= current {
            index += 1;
        }
        Some(index)
    }

    fn next_index(&self) -> Option<usize> {
        let current = self.current_index?;
        if self.shuffle {
            return self.shuffled_index();
        }

        if current + 1 < self.queue.len() {
            Some(current + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn prev_index(&self) -> Option<usize> {
        let current = self.current_index?;
        if self.shuffle {
            return self.shuffled_index();
        }

        if current > 0 {
            Some(current - 1)
        } else if self.repeat == RepeatMode::All {
            Some(self.queue.len() - 1)
        } else {
            Some(0)
        }
    }
}

pub struct PlaybackSession {
    media: Arc<dyn MediaElement>,
    state: Mutex<SessionState>,
    observers: ObserverRegistry,
    events: Option<EventBus>,
}

impl PlaybackSession {
    pub fn new(media: Arc<dyn MediaElement>, initial_volume: f64) -> Self {
        let volume = if initial_volume.is_nan() {
            DEFAULT_VOLUME
        } else {
            initial_volume.clamp(0.0, 1.0)
        };
        media.set_volume(volume);

        Self {
            media,
            state: Mutex::new(SessionState {
                queue: Arc::from(Vec::new()),
                current_index: None,
                is_playing: false,
                load: 0,
                shuffle: false,
                repeat: RepeatMode::Off,
                volume,
            }),
            observers: ObserverRegistry::new(),
            events: None,
        }
    }

    /// Publish transitions on `bus` as [`PlaybackEvent`]s.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Register `observer`. It is called after every state change until the
    /// returned handle is dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&PlaybackSnapshot) + Send + Sync + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn get_state(&self) -> PlaybackSnapshot {
        let (queue, current_index, is_playing, shuffle, repeat, volume) = {
            let state = self.state.lock();
            (
                Arc::clone(&state.queue),
                state.current_index,
                state.is_playing,
                state.shuffle,
                state.repeat,
                state.volume,
            )
        };

        let duration = self.media.duration();
        PlaybackSnapshot {
            queue,
            current_index,
            is_playing,
            shuffle,
            repeat,
            volume,
            current_time: self.media.current_time(),
            duration: if duration.is_nan() { 0.0 } else { duration },
        }
    }

    pub fn media(&self) -> &Arc<dyn MediaElement> {
        &self.media
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Replace the queue and load the track at `start_index` (clamped)
    /// without starting it. An empty list returns the session to idle.
    #[instrument(skip(self, songs), fields(len = songs.len()))]
    pub fn set_queue(&self, songs: Vec<Song>, start_index: usize) {
        let queue: Arc<[Song]> = Arc::from(songs);
        let len = queue.len();

        let loaded = {
            let mut state = self.state.lock();
            state.queue = Arc::clone(&queue);
            state.is_playing = false;
            state.load += 1;
            state.current_index = if len == 0 {
                None
            } else {
                Some(start_index.min(len - 1))
            };
            state
                .current_index
                .map(|index| (index, queue[index].clone()))
        };

        self.media.pause();
        match &loaded {
            Some((_, song)) => self.load_source(song),
            None => self.media.set_source(None),
        }

        debug!(current_index = ?loaded.as_ref().map(|(i, _)| *i), "Queue replaced");
        self.notify();
        self.emit(PlaybackEvent::QueueReplaced {
            length: len,
            current_index: loaded.as_ref().map(|(index, _)| *index),
        });
        if let Some((index, song)) = loaded {
            self.emit_track_changed(index, &song);
        }
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Start the current track.
    #[instrument(skip(self))]
    pub async fn play(&self) -> PlayOutcome {
        let (song_id, load) = {
            let mut state = self.state.lock();
            let Some(song_id) = state.current_song().map(|song| song.id) else {
                return PlayOutcome::NothingToPlay;
            };
            state.is_playing = true;
            (song_id, state.load)
        };

        self.notify();
        self.start_media(song_id, load).await
    }

    #[instrument(skip(self))]
    pub fn pause(&self) {
        let paused = {
            let mut state = self.state.lock();
            let was_playing = state.is_playing;
            state.is_playing = false;
            state
                .current_song()
                .filter(|_| was_playing)
                .map(|song| song.id)
        };

        self.media.pause();
        self.notify();

        if let Some(song_id) = paused {
            self.emit(PlaybackEvent::Paused {
                song_id: song_id.get(),
                position_ms: (self.media.current_time().max(0.0) * 1000.0) as u64,
            });
        }
    }

    pub async fn toggle_play(&self) -> PlayOutcome {
        let is_playing = self.state.lock().is_playing;
        if is_playing {
            self.pause();
            PlayOutcome::Paused
        } else {
            self.play().await
        }
    }

    /// Advance to the next track and start it.
    ///
    /// With shuffle on, a random other track. Otherwise the following one,
    /// wrapping only with [`RepeatMode::All`]. At the end of the queue with
    /// repeat off nothing happens.
    #[instrument(skip(self))]
    pub async fn next(&self) -> PlayOutcome {
        let target = self.state.lock().next_index();
        match target {
            Some(index) => self.load_and_play(index).await,
            None => PlayOutcome::NothingToPlay,
        }
    }

    /// Go back one track and start it. Before the first track this wraps
    /// with [`RepeatMode::All`] and otherwise restarts track 0.
    #[instrument(skip(self))]
    pub async fn prev(&self) -> PlayOutcome {
        let target = self.state.lock().prev_index();
        match target {
            Some(index) => self.load_and_play(index).await,
            None => PlayOutcome::NothingToPlay,
        }
    }

    /// Jump to `index` and start it. An index outside the queue is a no-op.
    #[instrument(skip(self))]
    pub async fn play_track_at_index(&self, index: usize) -> PlayOutcome {
        self.load_and_play(index).await
    }

    /// Seek to `percent` of the duration. Ignored while the duration is
    /// unknown.
    pub fn seek_to(&self, percent: f64) {
        let duration = self.media.duration();
        if duration.is_nan() || duration <= 0.0 || percent.is_nan() {
            return;
        }

        self.media
            .set_current_time(percent.clamp(0.0, 1.0) * duration);
        self.notify();
    }

    pub fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            return;
        }

        let volume = volume.clamp(0.0, 1.0);
        self.state.lock().volume = volume;
        self.media.set_volume(volume);
        self.notify();
    }

    pub fn toggle_shuffle(&self) {
        {
            let mut state = self.state.lock();
            state.shuffle = !state.shuffle;
        }
        self.notify();
    }

    pub fn cycle_repeat(&self) -> RepeatMode {
        let repeat = {
            let mut state = self.state.lock();
            state.repeat = state.repeat.cycle();
            state.repeat
        };
        self.notify();
        repeat
    }

    // ------------------------------------------------------------------
    // Media events
    // ------------------------------------------------------------------

    /// Fold a media element notification into session state.
    #[instrument(skip(self))]
    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata | MediaEvent::TimeUpdate => self.notify(),
            MediaEvent::Play => self.sync_playing(true),
            MediaEvent::Pause => self.sync_playing(false),
            MediaEvent::Ended => self.handle_ended().await,
            MediaEvent::Error { message } => {
                let song_id = {
                    let mut state = self.state.lock();
                    state.is_playing = false;
                    state.current_song().map(|song| song.id)
                };

                warn!(%message, "Media element error");
                self.notify();
                self.emit(PlaybackEvent::Error {
                    song_id: song_id.map(SongId::get),
                    message,
                });
            }
        }
    }

    async fn handle_ended(&self) {
        let (song_id, repeat, load) = {
            let state = self.state.lock();
            (state.current_song().map(|song| song.id), state.repeat, state.load)
        };
        let Some(song_id) = song_id else {
            return;
        };

        self.emit(PlaybackEvent::Completed {
            song_id: song_id.get(),
        });

        if repeat == RepeatMode::One {
            debug!("Repeating current track");
            self.media.set_current_time(0.0);
            self.state.lock().is_playing = true;
            self.notify();
            self.start_media(song_id, load).await;
            return;
        }

        if self.next().await == PlayOutcome::NothingToPlay {
            debug!("Reached end of queue");
            self.sync_playing(false);
        }
    }

    fn sync_playing(&self, playing: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.is_playing != playing;
            state.is_playing = playing;
            changed
        };

        if changed {
            self.notify();
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_and_play(&self, index: usize) -> PlayOutcome {
        let (song, load) = {
            let mut state = self.state.lock();
            let Some(song) = state.queue.get(index).cloned() else {
                return PlayOutcome::NothingToPlay;
            };
            state.current_index = Some(index);
            state.is_playing = true;
            state.load += 1;
            (song, state.load)
        };

        self.load_source(&song);
        self.notify();
        self.emit_track_changed(index, &song);

        self.start_media(song.id, load).await
    }

    fn load_source(&self, song: &Song) {
        self.media.set_source(Some(&song.audio));
        self.media.load();
    }

    /// Await `media.play()`, reverting `is_playing` if it is refused while
    /// `load` is still the current source.
    async fn start_media(&self, song_id: SongId, load: u64) -> PlayOutcome {
        match self.media.play().await {
            Ok(()) => {
                info!(song_id = %song_id, "Playback started");
                self.emit(PlaybackEvent::Started {
                    song_id: song_id.get(),
                });
                PlayOutcome::Started
            }
            Err(err) => {
                let err = PlaybackError::from(err);
                let reason = err.to_string();

                let current = {
                    let mut state = self.state.lock();
                    let current = state.load == load;
                    if current {
                        state.is_playing = false;
                    }
                    current
                };
                if !current {
                    debug!(song_id = %song_id, error = %err, "Ignoring rejection of a replaced source");
                    return PlayOutcome::Rejected { reason };
                }

                warn!(song_id = %song_id, error = %err, "Playback rejected");
                self.notify();
                self.emit(PlaybackEvent::Error {
                    song_id: Some(song_id.get()),
                    message: reason.clone(),
                });
                PlayOutcome::Rejected { reason }
            }
        }
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }
        self.observers.notify(&self.get_state());
    }

    fn emit_track_changed(&self, index: usize, song: &Song) {
        self.emit(PlaybackEvent::TrackChanged {
            song_id: song.id.get(),
            index,
            title: song.title.clone(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PlaybackSession")
            .field("queue_len", &state.queue.len())
            .field("current_index", &state.current_index)
            .field("is_playing", &state.is_playing)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Forward media element notifications into `session` until the sender
/// side closes.
pub fn spawn_media_event_pump(
    session: Arc<PlaybackSession>,
    mut events: UnboundedReceiver<MediaEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            session.handle_media_event(event).await;
        }
        debug!("Media event pump stopped");
    })
}
