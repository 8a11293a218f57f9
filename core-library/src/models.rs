//! Domain models for the music catalog
//!
//! Client-side projections of backend records. Backend payloads arrive as the
//! snake_case `Raw*` types from `bridge-traits`; the `From` impls here turn
//! them into the display shape every screen uses. Serialized form is
//! camelCase so persisted collections stay readable by the web client.

use bridge_traits::catalog::{RawArtist, RawGenre, RawPlaylist, RawSong};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ID Types
// =============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a song
    SongId
);
numeric_id!(
    /// Unique identifier for an artist
    ArtistId
);
numeric_id!(GenreId);
numeric_id!(PlaylistId);

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub image: String,
    /// Display string such as `"2M"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Playlist as embedded in a song. Same as [`Playlist`] without the count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRef {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    #[serde(default)]
    pub is_hero_slide: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    /// Number of catalog songs in this playlist, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_count: Option<usize>,
    #[serde(default)]
    pub is_hero_slide: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: Artist,
    pub album: String,
    /// Display duration, `m:ss`
    pub duration: String,
    pub cover: String,
    pub audio: String,
    pub playlist: PlaylistRef,
    pub genre: Genre,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_recently_played: bool,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_new_release: bool,
    #[serde(default)]
    pub is_top_chart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<String>,
}

// =============================================================================
// Normalization
// =============================================================================

/// Format whole seconds as `m:ss`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Follower counts come in millions; zero means the backend has none.
pub fn format_followers(followers: Option<u64>) -> Option<String> {
    followers.filter(|n| *n > 0).map(|n| format!("{}M", n))
}

impl From<RawArtist> for Artist {
    fn from(raw: RawArtist) -> Self {
        Self {
            id: ArtistId(raw.id),
            name: raw.name,
            image: raw.image,
            followers: format_followers(raw.followers),
            is_favorite: raw.is_favorite,
        }
    }
}

impl From<RawGenre> for Genre {
    fn from(raw: RawGenre) -> Self {
        Self {
            id: GenreId(raw.id),
            name: raw.name,
            image: raw.image,
        }
    }
}

impl From<RawPlaylist> for PlaylistRef {
    fn from(raw: RawPlaylist) -> Self {
        Self {
            id: PlaylistId(raw.id),
            name: raw.name,
            description: raw.description,
            image: raw.image,
            is_hero_slide: raw.is_hero_slide,
            is_featured: raw.is_featured,
            is_profile: raw.is_profile,
        }
    }
}

impl Playlist {
    pub fn from_raw(raw: RawPlaylist, song_count: Option<usize>) -> Self {
        Self {
            id: PlaylistId(raw.id),
            name: raw.name,
            description: raw.description,
            image: raw.image,
            song_count,
            is_hero_slide: raw.is_hero_slide,
            is_featured: raw.is_featured,
            is_profile: raw.is_profile,
        }
    }
}

impl From<RawPlaylist> for Playlist {
    fn from(raw: RawPlaylist) -> Self {
        Self::from_raw(raw, None)
    }
}

impl From<RawSong> for Song {
    fn from(raw: RawSong) -> Self {
        Self {
            id: SongId(raw.id),
            title: raw.title,
            artist: raw.artist.into(),
            album: raw.album,
            duration: format_duration(raw.duration),
            cover: raw.cover,
            audio: raw.audio,
            playlist: raw.playlist.into(),
            genre: raw.genre.into(),
            is_liked: raw.is_liked,
            is_recently_played: raw.is_recently_played,
            is_trending: raw.is_trending,
            is_new_release: raw.is_new_release,
            is_top_chart: raw.is_top_chart,
            last_played_at: raw.last_played_at,
        }
    }
}
