//! # Host Bridge Traits
//!
//! Capabilities the Wavify core needs from its host.
//!
//! ## Overview
//!
//! The core never talks to the network, disk or an audio device directly.
//! Each of those is a trait defined here and implemented per platform
//! (`bridge-desktop` ships the desktop defaults).
//!
//! ## Traits
//!
//! ### Data
//! - [`CatalogSource`](catalog::CatalogSource) - Remote songs/artists/genres/playlists API
//! - [`PersistentStore`](storage::PersistentStore) - Durable key-value storage for cache entries
//!
//! ### Playback
//! - [`MediaElement`](media::MediaElement) - The single audio output driven by the session
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic cache tests
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridges report failures as [`BridgeError`](error::BridgeError).
//! Cancellation has its own variant so the core can propagate it instead of
//! falling back to cached data.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; implementations are shared behind
//! `Arc` across tokio tasks.

pub mod catalog;
pub mod error;
pub mod media;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use catalog::{CatalogSource, RawArtist, RawGenre, RawPlaylist, RawSong};
pub use media::{MediaElement, MediaEvent};
pub use storage::{InMemoryStore, PersistentStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
