//! Library actions
//!
//! User-specific reads and writes on top of the catalog cache: play history,
//! likes, followed artists and the persisted library snapshot.
//!
//! Fire-and-report actions (`track_play`, `set_song_liked`, ...) return
//! `true` on success and log failures instead of returning them, so UI code
//! can ignore the result. Every successful mutation invalidates the
//! collections it changed.

use bridge_traits::catalog::CatalogSource;
use core_runtime::events::{CoreEvent, LibraryEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::cache::{EntityKind, FetchOptions};
use crate::catalog::CatalogCache;
use crate::error::{LibraryError, Result};
use crate::models::{Artist, ArtistId, Song, SongId};
use crate::optimistic::OptimisticUpdate;
use crate::persistent::RECENTLY_PLAYED_KEY;
use crate::query::{favorite_artists, liked_songs};
use crate::snapshot::{LibrarySnapshot, LibrarySnapshotCache};

pub struct Library {
    catalog: Arc<dyn CatalogSource>,
    cache: Arc<CatalogCache>,
    snapshots: LibrarySnapshotCache,
}

impl Library {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        cache: Arc<CatalogCache>,
        snapshot_ttl: Duration,
    ) -> Self {
        let snapshots = LibrarySnapshotCache::new(
            cache.persistent().clone(),
            Arc::clone(cache.clock()),
            snapshot_ttl,
        );

        Self {
            catalog,
            cache,
            snapshots,
        }
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// The user's play history.
    ///
    /// A non-empty persisted list is returned as is. Otherwise the history is
    /// fetched and persisted. Unlike catalog collections, failures and
    /// cancellation are returned to the caller.
    #[instrument(skip(self, options), fields(force = options.force))]
    pub async fn recently_played(&self, options: FetchOptions) -> Result<Vec<Song>> {
        let persistent = self.cache.persistent();

        if !options.force {
            if let Some(entry) = persistent.load::<Song>(RECENTLY_PLAYED_KEY) {
                if !entry.data.is_empty() {
                    debug!(count = entry.data.len(), "Recently played served from store");
                    return Ok(entry.data);
                }
            }
        }

        let cancel = options.cancel.unwrap_or_default();
        let raw = self.catalog.list_recently_played(cancel).await?;
        let songs: Vec<Song> = raw.into_iter().map(Song::from).collect();

        persistent.save(RECENTLY_PLAYED_KEY, &songs, self.snapshots.now());

        debug!(count = songs.len(), "Recently played fetched");
        Ok(songs)
    }

    /// Report a play. Invalidates songs and the play history.
    #[instrument(skip(self))]
    pub async fn track_play(&self, song_id: SongId) -> bool {
        match self.catalog.record_play(song_id.get()).await {
            Ok(()) => {
                self.cache.invalidate(EntityKind::Songs);
                self.cache.persistent().delete(RECENTLY_PLAYED_KEY);
                self.snapshots.clear();
                debug!("Play recorded");
                self.emit(LibraryEvent::PlayRecorded {
                    song_id: song_id.get(),
                });
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to record play");
                self.emit_failure("track_play", &err.to_string());
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn set_recently_played(&self, song_id: SongId) -> bool {
        match self.catalog.set_recently_played(song_id.get()).await {
            Ok(()) => {
                self.cache.invalidate(EntityKind::Songs);
                self.cache.persistent().delete(RECENTLY_PLAYED_KEY);
                self.snapshots.clear();
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to mark song as recently played");
                self.emit_failure("set_recently_played", &err.to_string());
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn set_song_liked(&self, song_id: SongId, liked: bool) -> bool {
        match self.catalog.set_liked(song_id.get(), liked).await {
            Ok(()) => {
                self.after_like_change(song_id, liked);
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to update like");
                self.emit_failure("set_song_liked", &err.to_string());
                false
            }
        }
    }

    /// Follow or unfollow. Songs embed their artist, so both collections
    /// are invalidated.
    #[instrument(skip(self))]
    pub async fn set_artist_favorite(&self, artist_id: ArtistId, favorite: bool) -> bool {
        match self.catalog.set_favorite(artist_id.get(), favorite).await {
            Ok(()) => {
                self.after_follow_change(artist_id, favorite);
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to update followed artist");
                self.emit_failure("set_artist_favorite", &err.to_string());
                false
            }
        }
    }

    /// Flip `is_liked` on the matching song in `songs` immediately, then
    /// confirm with the backend. On failure the list is restored and the
    /// error returned. Returns the new liked state.
    #[instrument(skip(self, songs))]
    pub async fn toggle_song_like(&self, songs: &mut [Song], song_id: SongId) -> Result<bool> {
        let index = songs
            .iter()
            .position(|song| song.id == song_id)
            .ok_or_else(|| LibraryError::not_found("song", song_id))?;
        let liked = !songs[index].is_liked;

        let update = OptimisticUpdate::apply(songs, |songs| songs[index].is_liked = liked);

        match self.catalog.set_liked(song_id.get(), liked).await {
            Ok(()) => {
                update.commit();
                self.after_like_change(song_id, liked);
                Ok(liked)
            }
            Err(err) => {
                update.rollback();
                error!(error = %err, "Like toggle rejected, rolled back");
                self.emit_failure("toggle_song_like", &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Optimistic follow toggle over `artists`. Same contract as
    /// [`Library::toggle_song_like`].
    #[instrument(skip(self, artists))]
    pub async fn toggle_artist_follow(
        &self,
        artists: &mut [Artist],
        artist_id: ArtistId,
    ) -> Result<bool> {
        let index = artists
            .iter()
            .position(|artist| artist.id == artist_id)
            .ok_or_else(|| LibraryError::not_found("artist", artist_id))?;
        let favorite = !artists[index].is_favorite;

        let update =
            OptimisticUpdate::apply(artists, |artists| artists[index].is_favorite = favorite);

        match self.catalog.set_favorite(artist_id.get(), favorite).await {
            Ok(()) => {
                update.commit();
                self.after_follow_change(artist_id, favorite);
                Ok(favorite)
            }
            Err(err) => {
                update.rollback();
                error!(error = %err, "Follow toggle rejected, rolled back");
                self.emit_failure("toggle_artist_follow", &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Cached library snapshot, or a freshly assembled (and saved) one.
    #[instrument(skip(self, options))]
    pub async fn load_snapshot(&self, options: FetchOptions) -> Result<LibrarySnapshot> {
        if !options.force {
            if let Some(snapshot) = self.snapshots.load() {
                debug!("Library snapshot cache hit");
                return Ok(snapshot);
            }
        }

        let lookup = FetchOptions {
            force: false,
            cancel: options.cancel.clone(),
        };
        let songs = self.cache.songs(lookup.clone()).await?;
        let artists = self.cache.artists(lookup).await?;
        let recently_played = self.recently_played(options).await?;

        let snapshot = LibrarySnapshot {
            timestamp: self.snapshots.now(),
            liked_songs: liked_songs(&songs),
            favorite_artists: favorite_artists(&artists),
            recently_played,
        };
        self.snapshots.save(&snapshot);

        info!(
            liked = snapshot.liked_songs.len(),
            following = snapshot.favorite_artists.len(),
            history = snapshot.recently_played.len(),
            "Library snapshot assembled"
        );
        Ok(snapshot)
    }

    pub fn clear_snapshot(&self) {
        self.snapshots.clear();
    }

    fn after_like_change(&self, song_id: SongId, liked: bool) {
        self.cache.invalidate(EntityKind::Songs);
        self.snapshots.clear();
        self.emit(LibraryEvent::SongLikeChanged {
            song_id: song_id.get(),
            liked,
        });
    }

    fn after_follow_change(&self, artist_id: ArtistId, favorite: bool) {
        self.cache.invalidate(EntityKind::Artists);
        self.cache.invalidate(EntityKind::Songs);
        self.snapshots.clear();
        self.emit(LibraryEvent::ArtistFavoriteChanged {
            artist_id: artist_id.get(),
            favorite,
        });
    }

    fn emit_failure(&self, action: &str, message: &str) {
        self.emit(LibraryEvent::ActionFailed {
            action: action.to_string(),
            message: message.to_string(),
        });
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = self.cache.events() {
            let _ = bus.emit(CoreEvent::Library(event));
        }
    }
}
