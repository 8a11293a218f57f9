//! # Event Bus System
//!
//! Typed broadcast events for everything the core does in the background:
//! cache resolution, library actions and playback transitions.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps one enum per domain
//! - **EventBus**: a `tokio::sync::broadcast` channel; cloning shares it
//! - **EventStream**: a receiver with an optional predicate
//!
//! Hosts use the bus for diagnostics and for side effects that should not sit
//! on the hot path (analytics, UI toasts after a failed like). UI state itself
//! is driven by the playback session's observer registry, not by this bus.
//!
//! ```text
//! ┌──────────────┐  emit   ┌──────────┐  subscribe  ┌────────────┐
//! │ CatalogCache ├────────>│          ├────────────>│ Subscriber │
//! └──────────────┘         │ EventBus │             └────────────┘
//! ┌──────────────┐  emit   │          │  subscribe  ┌────────────┐
//! │   Playback   ├────────>│          ├────────────>│ Subscriber │
//! └──────────────┘         └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Cache(CacheEvent::Invalidated {
//!     entity: "songs".to_string(),
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Cache(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed. Publishers in the core ignore
//! that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Cache(CacheEvent),
    Library(LibraryEvent),
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::ActionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::FetchFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::Cleared) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::QueueReplaced { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Where a cached collection was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    Memory,
    Persistent,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the entity fetch caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Served without touching the network.
    Hit {
        entity: String,
        tier: CacheTier,
        count: usize,
    },
    /// Network fetch completed and was stored.
    Fetched { entity: String, count: usize },
    /// Network fetch failed; `fallback_count` items were served instead.
    FetchFailed {
        entity: String,
        message: String,
        fallback_count: usize,
    },
    /// Memory, in-flight marker and persisted entry dropped.
    Invalidated { entity: String },
    /// Every cache wiped (logout).
    Cleared,
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Hit { .. } => "Cache hit",
            CacheEvent::Fetched { .. } => "Collection fetched",
            CacheEvent::FetchFailed { .. } => "Fetch failed, served fallback",
            CacheEvent::Invalidated { .. } => "Cache invalidated",
            CacheEvent::Cleared => "All caches cleared",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to user library actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    PlayRecorded { song_id: u64 },
    SongLikeChanged { song_id: u64, liked: bool },
    ArtistFavoriteChanged { artist_id: u64, favorite: bool },
    /// A remote action failed; any optimistic change was rolled back.
    ActionFailed { action: String, message: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::PlayRecorded { .. } => "Play recorded",
            LibraryEvent::SongLikeChanged { .. } => "Song like changed",
            LibraryEvent::ArtistFavoriteChanged { .. } => "Artist follow changed",
            LibraryEvent::ActionFailed { .. } => "Library action failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the playback session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Queue replaced wholesale.
    QueueReplaced {
        length: usize,
        current_index: Option<usize>,
    },
    /// A different track was loaded.
    TrackChanged {
        song_id: u64,
        index: usize,
        title: String,
    },
    Started { song_id: u64 },
    Paused {
        song_id: u64,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Track reached its natural end.
    Completed { song_id: u64 },
    Error {
        song_id: Option<u64>,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::QueueReplaced { .. } => "Queue replaced",
            PlaybackEvent::TrackChanged { .. } => "Track changed",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning is cheap and every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus. Subscribers falling more than `capacity`
    /// events behind receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned from `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
