//! Remote Catalog Source
//!
//! Contract for the backend that owns songs, artists, genres and playlists.
//! Records come back in the backend's own snake_case shape; normalization into
//! client entities happens in `core-library`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Artist record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArtist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Follower count in millions. Zero or absent means unknown.
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGenre {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPlaylist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_hero_slide: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_profile: bool,
}

/// Song record as returned by the backend.
///
/// `artist` is always an object. Payloads carrying a bare artist name fail to
/// deserialize instead of being coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSong {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub album: String,
    /// Track length in whole seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub audio: String,
    pub artist: RawArtist,
    pub genre: RawGenre,
    pub playlist: RawPlaylist,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_new_release: bool,
    #[serde(default)]
    pub is_top_chart: bool,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_recently_played: bool,
    #[serde(default)]
    pub last_played_at: Option<String>,
}

/// Remote entity source trait
///
/// Every list operation takes a cancellation token. Implementations must
/// return [`BridgeError::Cancelled`](crate::error::BridgeError::Cancelled)
/// once the token fires so callers can tell an aborted request apart from an
/// empty collection.
///
/// Mutating calls (`record_play`, `set_liked`, ...) change server-side flags;
/// the caller is responsible for invalidating any cached collection they
/// affect.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::CatalogSource;
/// use tokio_util::sync::CancellationToken;
///
/// async fn count_songs(source: &dyn CatalogSource) -> usize {
///     source
///         .list_songs(CancellationToken::new())
///         .await
///         .map(|songs| songs.len())
///         .unwrap_or(0)
/// }
/// ```
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_songs(&self, cancel: CancellationToken) -> Result<Vec<RawSong>>;

    async fn list_artists(&self, cancel: CancellationToken) -> Result<Vec<RawArtist>>;

    async fn list_genres(&self, cancel: CancellationToken) -> Result<Vec<RawGenre>>;

    async fn list_playlists(&self, cancel: CancellationToken) -> Result<Vec<RawPlaylist>>;

    /// The signed-in user's play history, most recent first.
    async fn list_recently_played(&self, cancel: CancellationToken) -> Result<Vec<RawSong>>;

    /// Report that a song started playing.
    async fn record_play(&self, song_id: u64) -> Result<()>;

    async fn set_liked(&self, song_id: u64, liked: bool) -> Result<()>;

    async fn set_recently_played(&self, song_id: u64) -> Result<()>;

    /// Follow or unfollow an artist.
    async fn set_favorite(&self, artist_id: u64, favorite: bool) -> Result<()>;
}
