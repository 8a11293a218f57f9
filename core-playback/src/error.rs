//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
///
/// Transport commands absorb failures into session state; this type carries
/// the reason a `play()` was refused into
/// [`PlayOutcome::Rejected`](crate::state::PlayOutcome::Rejected).
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The media element refused to start (autoplay policy, decode failure).
    #[error("Media element rejected playback: {0}")]
    Media(#[from] BridgeError),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
