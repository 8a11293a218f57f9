//! # Catalog and Library Module
//!
//! Serves catalog entities to every screen and owns the user's library
//! actions.
//!
//! ## Overview
//!
//! This module manages:
//! - Domain models and normalization of backend records
//! - Two-tier entity caching (memory with TTL, then the persistent store)
//!   with single-flight network fetches and cancellation
//! - Derived queries (liked, trending, by playlist/artist/genre, lookups)
//! - Library actions: play tracking, likes, follows, optimistic toggles and
//!   the persisted library snapshot
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::{CatalogCache, FetchOptions};
//!
//! let catalog = CatalogCache::new(source, store, clock, ttl, None);
//! let trending = catalog.trending_songs(FetchOptions::default()).await?;
//! ```

pub mod cache;
pub mod catalog;
pub mod error;
pub mod library;
pub mod models;
pub mod optimistic;
pub mod persistent;
pub mod query;
pub mod snapshot;
pub mod sources;

pub use cache::{CacheContext, EntityCache, EntityKind, EntitySource, FetchOptions};
pub use catalog::CatalogCache;
pub use error::{LibraryError, Result};
pub use library::Library;
pub use models::{
    Artist, ArtistId, Genre, GenreId, Playlist, PlaylistId, PlaylistRef, Song, SongId,
};
pub use optimistic::OptimisticUpdate;
pub use persistent::{CacheEntry, PersistentCache};
pub use snapshot::{LibrarySnapshot, LibrarySnapshotCache};
