//! Wavify client core.
//!
//! Facade over the workspace crates so host applications depend on a single
//! crate. The `desktop-shims` feature (default) brings in the reqwest catalog
//! source, the JSON file store and the headless media element; `headless`
//! builds without them and expects every bridge to be injected.

pub use bridge_traits as bridges;
pub use core_library as library;
pub use core_playback as playback;
pub use core_runtime as runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;

pub use core_library::{
    Artist, ArtistId, CatalogCache, FetchOptions, Genre, GenreId, Library, LibraryError,
    Playlist, PlaylistId, Song, SongId,
};
pub use core_playback::{PlayOutcome, PlaybackSession, PlaybackSnapshot, RepeatMode, Subscription};
pub use core_runtime::config::CoreConfig;
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};
pub use core_runtime::logging::{init_logging, LoggingConfig};
pub use core_service::{CoreError, CoreService};
