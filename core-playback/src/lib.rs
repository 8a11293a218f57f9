//! # Playback Session
//!
//! Queue, transport and observer notification for the single audio output.
//!
//! ## Overview
//!
//! This module handles:
//! - The play queue and current track
//! - Play/pause, next/prev with shuffle and repeat
//! - Seeking and volume
//! - Folding media element events (ended, errors) back into state
//! - Notifying observers with a [`PlaybackSnapshot`] after each change
//!
//! Audio itself is produced by a host [`MediaElement`](bridge_traits::MediaElement);
//! the session only drives it.

pub mod error;
pub mod observers;
pub mod session;
pub mod state;

pub use error::{PlaybackError, Result};
pub use observers::{ObserverRegistry, Subscription};
pub use session::{spawn_media_event_pump, PlaybackSession, DEFAULT_VOLUME};
pub use state::{PlayOutcome, PlaybackSnapshot, RepeatMode};
