//! Catalog cache
//!
//! Owns one [`EntityCache`] per catalog collection and the persistent store
//! they share. This is the object the rest of the core injects; the query
//! helpers in [`crate::query`] and the [`Library`](crate::library::Library)
//! actions are built on it.

use bridge_traits::catalog::CatalogSource;
use bridge_traits::storage::PersistentStore;
use bridge_traits::time::Clock;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::cache::{CacheContext, EntityCache, EntityKind, FetchOptions};
use crate::error::Result;
use crate::models::{Artist, Genre, Playlist, Song};
use crate::persistent::{PersistentCache, ALL_KEYS};
use crate::sources::{ArtistSource, GenreSource, PlaylistSource, SongSource};

pub struct CatalogCache {
    songs: Arc<EntityCache<Song>>,
    artists: EntityCache<Artist>,
    genres: EntityCache<Genre>,
    playlists: EntityCache<Playlist>,
    persistent: PersistentCache,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
}

impl CatalogCache {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        events: Option<EventBus>,
    ) -> Self {
        let context = CacheContext {
            persistent: PersistentCache::new(store),
            clock,
            ttl,
            events,
        };

        let songs = Arc::new(EntityCache::new(
            EntityKind::Songs,
            Arc::new(SongSource::new(Arc::clone(&catalog))),
            &context,
        ));
        let artists = EntityCache::new(
            EntityKind::Artists,
            Arc::new(ArtistSource::new(Arc::clone(&catalog))),
            &context,
        );
        let genres = EntityCache::new(
            EntityKind::Genres,
            Arc::new(GenreSource::new(Arc::clone(&catalog))),
            &context,
        );
        let playlists = EntityCache::new(
            EntityKind::Playlists,
            Arc::new(PlaylistSource::new(catalog, Arc::clone(&songs))),
            &context,
        );

        Self {
            songs,
            artists,
            genres,
            playlists,
            persistent: context.persistent,
            clock: context.clock,
            events: context.events,
        }
    }

    pub async fn songs(&self, options: FetchOptions) -> Result<Arc<Vec<Song>>> {
        self.songs.fetch(options).await
    }

    pub async fn artists(&self, options: FetchOptions) -> Result<Arc<Vec<Artist>>> {
        self.artists.fetch(options).await
    }

    pub async fn genres(&self, options: FetchOptions) -> Result<Arc<Vec<Genre>>> {
        self.genres.fetch(options).await
    }

    /// Playlists with `song_count` filled from the song cache.
    pub async fn playlists(&self, options: FetchOptions) -> Result<Arc<Vec<Playlist>>> {
        self.playlists.fetch(options).await
    }

    /// Forget one collection. Call after any server-side mutation of it.
    pub fn invalidate(&self, kind: EntityKind) {
        match kind {
            EntityKind::Songs => self.songs.invalidate(),
            EntityKind::Artists => self.artists.invalidate(),
            EntityKind::Genres => self.genres.invalidate(),
            EntityKind::Playlists => self.playlists.invalidate(),
        }
    }

    /// Whether a network request for `kind` is in flight.
    pub fn is_fetching(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Songs => self.songs.is_fetching(),
            EntityKind::Artists => self.artists.is_fetching(),
            EntityKind::Genres => self.genres.is_fetching(),
            EntityKind::Playlists => self.playlists.is_fetching(),
        }
    }

    /// Wipe memory and every persisted key, including recently played and
    /// the library snapshot. Used on logout.
    #[instrument(skip(self))]
    pub fn clear_all(&self) {
        for kind in EntityKind::ALL {
            self.invalidate(kind);
        }
        self.persistent.clear(ALL_KEYS);

        info!("Catalog cache cleared");
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Cache(CacheEvent::Cleared));
        }
    }

    pub fn persistent(&self) -> &PersistentCache {
        &self.persistent
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("songs", &self.songs)
            .field("artists", &self.artists)
            .field("genres", &self.genres)
            .field("playlists", &self.playlists)
            .finish()
    }
}
