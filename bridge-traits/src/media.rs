//! Media Element Abstraction
//!
//! A single audio output the playback session drives. Hosts wrap whatever
//! actually produces sound (an HTML audio element, a native player) behind
//! [`MediaElement`] and forward its notifications as [`MediaEvent`]s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Notifications emitted by the media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Duration became known for the current source.
    LoadedMetadata,
    /// Playback position advanced.
    TimeUpdate,
    /// Element started producing audio.
    Play,
    /// Element paused on its own or by request.
    Pause,
    /// Playback reached the end of the source.
    Ended,
    /// Loading or decoding failed.
    Error { message: String },
}

/// Media playback primitive
///
/// Times are seconds. `duration()` returns `0.0` or `NaN` while the duration
/// is unknown. Volume is in `[0.0, 1.0]`.
///
/// `play()` is the only suspending call: hosts may reject it (autoplay
/// policy, decode failure). Everything else is expected to be cheap and
/// infallible from the caller's perspective.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Assign the source URL. `None` detaches the current source.
    fn set_source(&self, url: Option<&str>);

    fn source(&self) -> Option<String>;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    /// Start (re)loading the current source.
    fn load(&self);

    /// Begin playback of the loaded source.
    async fn play(&self) -> Result<()>;

    fn pause(&self);
}
