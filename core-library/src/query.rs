//! Derived queries
//!
//! Stateless filters over cached collections. The free functions work on any
//! slice; the `CatalogCache` methods resolve the collection first (through the
//! cache, so they share its single-flight and fallback behavior) and then
//! filter. Name matching is case-insensitive.

use std::collections::HashSet;

use crate::cache::FetchOptions;
use crate::catalog::CatalogCache;
use crate::error::Result;
use crate::models::{Artist, ArtistId, Genre, GenreId, Playlist, PlaylistId, Song, SongId};

fn filter_songs(songs: &[Song], predicate: impl Fn(&Song) -> bool) -> Vec<Song> {
    songs.iter().filter(|song| predicate(song)).cloned().collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub fn liked_songs(songs: &[Song]) -> Vec<Song> {
    filter_songs(songs, |song| song.is_liked)
}

pub fn trending_songs(songs: &[Song]) -> Vec<Song> {
    filter_songs(songs, |song| song.is_trending)
}

pub fn new_releases(songs: &[Song]) -> Vec<Song> {
    filter_songs(songs, |song| song.is_new_release)
}

pub fn top_charts(songs: &[Song]) -> Vec<Song> {
    filter_songs(songs, |song| song.is_top_chart)
}

pub fn favorite_artists(artists: &[Artist]) -> Vec<Artist> {
    artists
        .iter()
        .filter(|artist| artist.is_favorite)
        .cloned()
        .collect()
}

/// Songs by any artist in `artists` that the user follows.
pub fn favorite_artist_songs(songs: &[Song], artists: &[Artist]) -> Vec<Song> {
    let favorites: HashSet<ArtistId> = artists
        .iter()
        .filter(|artist| artist.is_favorite)
        .map(|artist| artist.id)
        .collect();

    filter_songs(songs, |song| favorites.contains(&song.artist.id))
}

pub fn songs_by_playlist(songs: &[Song], id: PlaylistId) -> Vec<Song> {
    filter_songs(songs, |song| song.playlist.id == id)
}

pub fn songs_by_playlist_name(songs: &[Song], name: &str) -> Vec<Song> {
    filter_songs(songs, |song| same_name(&song.playlist.name, name))
}

pub fn songs_by_artist(songs: &[Song], id: ArtistId) -> Vec<Song> {
    filter_songs(songs, |song| song.artist.id == id)
}

pub fn songs_by_artist_name(songs: &[Song], name: &str) -> Vec<Song> {
    filter_songs(songs, |song| same_name(&song.artist.name, name))
}

pub fn songs_by_genre(songs: &[Song], id: GenreId) -> Vec<Song> {
    filter_songs(songs, |song| song.genre.id == id)
}

pub fn songs_by_genre_name(songs: &[Song], name: &str) -> Vec<Song> {
    filter_songs(songs, |song| same_name(&song.genre.name, name))
}

pub fn find_song(songs: &[Song], id: SongId) -> Option<Song> {
    songs.iter().find(|song| song.id == id).cloned()
}

pub fn find_artist(artists: &[Artist], id: ArtistId) -> Option<Artist> {
    artists.iter().find(|artist| artist.id == id).cloned()
}

pub fn find_artist_by_name(artists: &[Artist], name: &str) -> Option<Artist> {
    artists
        .iter()
        .find(|artist| same_name(&artist.name, name))
        .cloned()
}

pub fn find_genre(genres: &[Genre], id: GenreId) -> Option<Genre> {
    genres.iter().find(|genre| genre.id == id).cloned()
}

pub fn find_playlist(playlists: &[Playlist], id: PlaylistId) -> Option<Playlist> {
    playlists.iter().find(|playlist| playlist.id == id).cloned()
}

impl CatalogCache {
    pub async fn liked_songs(&self, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(liked_songs(&self.songs(options).await?))
    }

    pub async fn trending_songs(&self, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(trending_songs(&self.songs(options).await?))
    }

    pub async fn new_releases(&self, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(new_releases(&self.songs(options).await?))
    }

    pub async fn top_charts(&self, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(top_charts(&self.songs(options).await?))
    }

    pub async fn favorite_artists(&self, options: FetchOptions) -> Result<Vec<Artist>> {
        Ok(favorite_artists(&self.artists(options).await?))
    }

    pub async fn favorite_artist_songs(&self, options: FetchOptions) -> Result<Vec<Song>> {
        let artists = self.artists(options.clone()).await?;
        let songs = self.songs(options).await?;
        Ok(favorite_artist_songs(&songs, &artists))
    }

    pub async fn songs_by_playlist(
        &self,
        id: PlaylistId,
        options: FetchOptions,
    ) -> Result<Vec<Song>> {
        Ok(songs_by_playlist(&self.songs(options).await?, id))
    }

    pub async fn songs_by_playlist_name(
        &self,
        name: &str,
        options: FetchOptions,
    ) -> Result<Vec<Song>> {
        Ok(songs_by_playlist_name(&self.songs(options).await?, name))
    }

    pub async fn songs_by_artist(&self, id: ArtistId, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(songs_by_artist(&self.songs(options).await?, id))
    }

    pub async fn songs_by_artist_name(
        &self,
        name: &str,
        options: FetchOptions,
    ) -> Result<Vec<Song>> {
        Ok(songs_by_artist_name(&self.songs(options).await?, name))
    }

    pub async fn songs_by_genre(&self, id: GenreId, options: FetchOptions) -> Result<Vec<Song>> {
        Ok(songs_by_genre(&self.songs(options).await?, id))
    }

    pub async fn songs_by_genre_name(
        &self,
        name: &str,
        options: FetchOptions,
    ) -> Result<Vec<Song>> {
        Ok(songs_by_genre_name(&self.songs(options).await?, name))
    }

    pub async fn song(&self, id: SongId, options: FetchOptions) -> Result<Option<Song>> {
        Ok(find_song(&self.songs(options).await?, id))
    }

    pub async fn artist(&self, id: ArtistId, options: FetchOptions) -> Result<Option<Artist>> {
        Ok(find_artist(&self.artists(options).await?, id))
    }

    pub async fn artist_by_name(
        &self,
        name: &str,
        options: FetchOptions,
    ) -> Result<Option<Artist>> {
        Ok(find_artist_by_name(&self.artists(options).await?, name))
    }

    pub async fn genre(&self, id: GenreId, options: FetchOptions) -> Result<Option<Genre>> {
        Ok(find_genre(&self.genres(options).await?, id))
    }

    pub async fn playlist(&self, id: PlaylistId, options: FetchOptions) -> Result<Option<Playlist>> {
        Ok(find_playlist(&self.playlists(options).await?, id))
    }
}
