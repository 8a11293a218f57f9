//! [`EntitySource`] adapters over the remote [`CatalogSource`].
//!
//! Each adapter lists one collection and normalizes it. Playlists are a
//! composite: their song counts come from the song cache.

use async_trait::async_trait;
use bridge_traits::catalog::CatalogSource;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::{EntityCache, EntitySource, FetchOptions};
use crate::error::{LibraryError, Result};
use crate::models::{Artist, Genre, Playlist, PlaylistId, Song};

pub struct SongSource {
    catalog: Arc<dyn CatalogSource>,
}

impl SongSource {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl EntitySource<Song> for SongSource {
    async fn load(&self, cancel: CancellationToken) -> Result<Vec<Song>> {
        let raw = self.catalog.list_songs(cancel).await?;
        Ok(raw.into_iter().map(Song::from).collect())
    }
}

pub struct ArtistSource {
    catalog: Arc<dyn CatalogSource>,
}

impl ArtistSource {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl EntitySource<Artist> for ArtistSource {
    async fn load(&self, cancel: CancellationToken) -> Result<Vec<Artist>> {
        let raw = self.catalog.list_artists(cancel).await?;
        Ok(raw.into_iter().map(Artist::from).collect())
    }
}

pub struct GenreSource {
    catalog: Arc<dyn CatalogSource>,
}

impl GenreSource {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl EntitySource<Genre> for GenreSource {
    async fn load(&self, cancel: CancellationToken) -> Result<Vec<Genre>> {
        let raw = self.catalog.list_genres(cancel).await?;
        Ok(raw.into_iter().map(Genre::from).collect())
    }
}

/// Lists playlists and fills `song_count` from the (non-forced) song cache.
///
/// Cancellation of the song fetch propagates. Any other song failure leaves
/// every count at zero instead of failing the playlist fetch.
pub struct PlaylistSource {
    catalog: Arc<dyn CatalogSource>,
    songs: Arc<EntityCache<Song>>,
}

impl PlaylistSource {
    pub fn new(catalog: Arc<dyn CatalogSource>, songs: Arc<EntityCache<Song>>) -> Self {
        Self { catalog, songs }
    }
}

#[async_trait]
impl EntitySource<Playlist> for PlaylistSource {
    async fn load(&self, cancel: CancellationToken) -> Result<Vec<Playlist>> {
        let raw = self.catalog.list_playlists(cancel.clone()).await?;

        let songs = match self
            .songs
            .fetch(FetchOptions::default().with_cancel(cancel))
            .await
        {
            Ok(songs) => songs,
            Err(LibraryError::Cancelled) => return Err(LibraryError::Cancelled),
            Err(err) => {
                warn!(error = %err, "Song fetch failed, playlist counts default to 0");
                Arc::new(Vec::new())
            }
        };

        let mut counts: HashMap<PlaylistId, usize> = HashMap::new();
        for song in songs.iter() {
            *counts.entry(song.playlist.id).or_default() += 1;
        }

        Ok(raw
            .into_iter()
            .map(|playlist| {
                let count = counts.get(&PlaylistId(playlist.id)).copied().unwrap_or(0);
                Playlist::from_raw(playlist, Some(count))
            })
            .collect())
    }
}
