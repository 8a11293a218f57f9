//! Playback state types

use core_library::models::Song;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Queue repeat behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    /// Wrap around at either end of the queue
    All,
    /// Restart the current track when it ends
    One,
}

impl RepeatMode {
    /// `Off -> All -> One -> Off`
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Everything an observer needs to render the player.
///
/// `current_time` and `duration` are read from the media element when the
/// snapshot is taken; the rest is session state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub queue: Arc<[Song]>,
    /// `None` only when the queue is empty
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f64,
    /// Seconds
    pub current_time: f64,
    /// Seconds, `0.0` while unknown
    pub duration: f64,
}

impl PlaybackSnapshot {
    pub fn current_song(&self) -> Option<&Song> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    /// Position as a fraction of the duration, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Result of a command that may start playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Paused,
    /// No current track, or the command did not move off the current one.
    NothingToPlay,
    /// The media element refused to play; `is_playing` was reverted.
    Rejected { reason: String },
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlayOutcome::Started)
    }
}
