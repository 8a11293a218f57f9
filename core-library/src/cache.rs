//! Entity fetch cache
//!
//! One [`EntityCache`] per entity collection. A fetch resolves through three
//! tiers, in order:
//!
//! 1. memory, while younger than the TTL
//! 2. the persistent store, when it holds a non-empty collection
//! 3. the network, shared between every concurrent caller
//!
//! ## Single flight
//!
//! The network tier is a [`Shared`] future stored in the cache state. Callers
//! that arrive while it is pending clone and await the same future, so there
//! is never more than one request per collection in flight. Each caller races
//! the shared future against its own cancellation token; cancelling detaches
//! that caller only. When the last waiter detaches the request itself is
//! cancelled and the in-flight marker cleared, so the next caller starts a
//! fresh request instead of joining one nobody is driving.
//!
//! ## Invalidation
//!
//! [`EntityCache::invalidate`] drops memory, forgets the in-flight request and
//! deletes the persisted entry. Callers already waiting on that request still
//! receive its result. Every fetch is tagged with a generation number and
//! only writes back when the generation is still current, so a request that
//! was already running when the cache was invalidated can never resurrect
//! stale data.
//!
//! ## Failure
//!
//! A failed request (anything but cancellation) is logged and degrades to the
//! persisted collection, or to an empty one. Cancellation is the only error
//! [`EntityCache::fetch`] returns.

use async_trait::async_trait;
use bridge_traits::time::Clock;
use core_runtime::events::{CacheEvent, CacheTier, CoreEvent, EventBus};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{LibraryError, Result};
use crate::persistent::{PersistentCache, ARTISTS_KEY, GENRES_KEY, PLAYLISTS_KEY, SONGS_KEY};

/// Collections served through an [`EntityCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Songs,
    Artists,
    Genres,
    Playlists,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Songs,
        EntityKind::Artists,
        EntityKind::Genres,
        EntityKind::Playlists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Songs => "songs",
            EntityKind::Artists => "artists",
            EntityKind::Genres => "genres",
            EntityKind::Playlists => "playlists",
        }
    }

    pub fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::Songs => SONGS_KEY,
            EntityKind::Artists => ARTISTS_KEY,
            EntityKind::Genres => GENRES_KEY,
            EntityKind::Playlists => PLAYLISTS_KEY,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote loader behind an [`EntityCache`].
///
/// Implementations must stop and return [`LibraryError::Cancelled`] once
/// `cancel` fires.
#[async_trait]
pub trait EntitySource<T>: Send + Sync {
    async fn load(&self, cancel: CancellationToken) -> Result<Vec<T>>;
}

/// Per-call fetch options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Skip memory, persistent and in-flight tiers
    pub force: bool,
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Output of the shared network future. `Shared` needs a `Clone` output,
/// which `LibraryError` is not, and cancellation is the only failure that
/// survives the fallback path.
#[derive(Debug, Clone, Copy)]
struct Cancelled;

type SharedFetch<T> = Shared<BoxFuture<'static, std::result::Result<Arc<Vec<T>>, Cancelled>>>;

struct MemoryRecord<T> {
    timestamp: i64,
    data: Arc<Vec<T>>,
}

struct InFlight<T> {
    generation: u64,
    token: CancellationToken,
    future: SharedFetch<T>,
    /// Callers currently awaiting `future`
    waiters: usize,
}

struct CacheState<T> {
    memory: Option<MemoryRecord<T>>,
    in_flight: Option<InFlight<T>>,
    generation: u64,
}

/// Collaborators shared by every cache of one catalog.
#[derive(Clone)]
pub struct CacheContext {
    pub persistent: PersistentCache,
    pub clock: Arc<dyn Clock>,
    /// Memory lifetime
    pub ttl: Duration,
    pub events: Option<EventBus>,
}

/// Everything a fetch needs after it leaves the caller.
struct CacheInner<T> {
    kind: EntityKind,
    source: Arc<dyn EntitySource<T>>,
    persistent: PersistentCache,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    state: Mutex<CacheState<T>>,
}

/// Two-tier, single-flight cache for one entity collection.
pub struct EntityCache<T> {
    inner: Arc<CacheInner<T>>,
    ttl: Duration,
}

impl<T> EntityCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(kind: EntityKind, source: Arc<dyn EntitySource<T>>, context: &CacheContext) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                kind,
                source,
                persistent: context.persistent.clone(),
                clock: Arc::clone(&context.clock),
                events: context.events.clone(),
                state: Mutex::new(CacheState {
                    memory: None,
                    in_flight: None,
                    generation: 0,
                }),
            }),
            ttl: context.ttl,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.inner.kind
    }

    /// Resolve the collection. See the module docs for tier order.
    #[instrument(skip(self, options), fields(entity = %self.inner.kind, force = options.force))]
    pub async fn fetch(&self, options: FetchOptions) -> Result<Arc<Vec<T>>> {
        if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(LibraryError::Cancelled);
        }

        if !options.force {
            if let Some(data) = self.fresh_memory() {
                debug!(count = data.len(), "Memory cache hit");
                self.inner.emit_hit(CacheTier::Memory, data.len());
                return Ok(data);
            }

            if let Some(data) = self.promote_persistent() {
                debug!(count = data.len(), "Persistent cache hit");
                self.inner.emit_hit(CacheTier::Persistent, data.len());
                return Ok(data);
            }
        }

        let (future, _waiter) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;

            // Another caller may have finished a fetch since the check above.
            if !options.force {
                if let Some(memory) = &state.memory {
                    if self.is_fresh(memory.timestamp) {
                        return Ok(Arc::clone(&memory.data));
                    }
                }
            }

            if options.force {
                state.in_flight = None;
            } else if state.in_flight.is_some() {
                debug!("Joining in-flight fetch");
            }

            let in_flight = state
                .in_flight
                .get_or_insert_with(|| Self::start_fetch(&self.inner, &mut state.generation));
            in_flight.waiters += 1;

            let waiter = Waiter {
                inner: Arc::clone(&self.inner),
                generation: in_flight.generation,
            };
            (in_flight.future.clone(), waiter)
        };

        let outcome = match options.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Caller cancelled, detaching from fetch");
                        return Err(LibraryError::Cancelled);
                    }
                    outcome = future => outcome,
                }
            }
            None => future.await,
        };

        outcome.map_err(|Cancelled| LibraryError::Cancelled)
    }

    /// Drop memory, forget any in-flight request and delete the persisted
    /// entry.
    ///
    /// Callers already awaiting the forgotten request still get its result;
    /// it is never written back.
    #[instrument(skip(self), fields(entity = %self.inner.kind))]
    pub fn invalidate(&self) {
        {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.memory = None;
            state.in_flight = None;
            self.inner
                .persistent
                .delete(self.inner.kind.storage_key());
        }

        debug!("Cache invalidated");
        self.inner.emit(CacheEvent::Invalidated {
            entity: self.inner.kind.to_string(),
        });
    }

    /// Current memory value regardless of age.
    pub fn peek(&self) -> Option<Arc<Vec<T>>> {
        self.inner
            .state
            .lock()
            .memory
            .as_ref()
            .map(|memory| Arc::clone(&memory.data))
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    fn is_fresh(&self, timestamp: i64) -> bool {
        let age = self.inner.clock.unix_timestamp_millis() - timestamp;
        age < self.ttl.as_millis() as i64
    }

    fn fresh_memory(&self) -> Option<Arc<Vec<T>>> {
        let state = self.inner.state.lock();
        state
            .memory
            .as_ref()
            .filter(|memory| self.is_fresh(memory.timestamp))
            .map(|memory| Arc::clone(&memory.data))
    }

    /// Persisted entries are trusted regardless of their own age.
    fn promote_persistent(&self) -> Option<Arc<Vec<T>>> {
        let entry = self
            .inner
            .persistent
            .load::<T>(self.inner.kind.storage_key())?;
        if entry.data.is_empty() {
            return None;
        }

        let data = Arc::new(entry.data);
        let mut state = self.inner.state.lock();
        state.memory = Some(MemoryRecord {
            timestamp: self.inner.clock.unix_timestamp_millis(),
            data: Arc::clone(&data),
        });
        Some(data)
    }

    fn start_fetch(inner: &Arc<CacheInner<T>>, generation: &mut u64) -> InFlight<T> {
        *generation += 1;
        let generation = *generation;
        let token = CancellationToken::new();

        debug!(generation, "Starting network fetch");

        let future = Arc::clone(inner)
            .resolve(token.clone(), generation)
            .boxed()
            .shared();

        InFlight {
            generation,
            token,
            future,
            waiters: 0,
        }
    }
}

impl<T> CacheInner<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn resolve(
        self: Arc<Self>,
        token: CancellationToken,
        generation: u64,
    ) -> std::result::Result<Arc<Vec<T>>, Cancelled> {
        let key = self.kind.storage_key();

        match self.source.load(token).await {
            Ok(items) => {
                let data = Arc::new(items);
                let now = self.clock.unix_timestamp_millis();

                let stored = {
                    let mut state = self.state.lock();
                    if state.generation == generation {
                        state.memory = Some(MemoryRecord {
                            timestamp: now,
                            data: Arc::clone(&data),
                        });
                        state.in_flight = None;
                        self.persistent.save(key, data.as_slice(), now);
                        true
                    } else {
                        false
                    }
                };

                if stored {
                    debug!(entity = %self.kind, count = data.len(), "Fetched from network");
                    self.emit(CacheEvent::Fetched {
                        entity: self.kind.to_string(),
                        count: data.len(),
                    });
                } else {
                    debug!(entity = %self.kind, generation, "Discarding result of superseded fetch");
                }
                Ok(data)
            }
            Err(LibraryError::Cancelled) => {
                self.finish(generation);
                debug!(entity = %self.kind, "Fetch cancelled");
                Err(Cancelled)
            }
            Err(err) => {
                self.finish(generation);
                let fallback = self
                    .persistent
                    .load::<T>(key)
                    .map(|entry| entry.data)
                    .unwrap_or_default();

                warn!(
                    entity = %self.kind,
                    error = %err,
                    fallback_count = fallback.len(),
                    "Fetch failed, serving fallback"
                );
                self.emit(CacheEvent::FetchFailed {
                    entity: self.kind.to_string(),
                    message: err.to_string(),
                    fallback_count: fallback.len(),
                });
                Ok(Arc::new(fallback))
            }
        }
    }

    fn finish(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.in_flight = None;
        }
    }

    fn emit_hit(&self, tier: CacheTier, count: usize) {
        self.emit(CacheEvent::Hit {
            entity: self.kind.to_string(),
            tier,
            count,
        });
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }
}

impl<T> CacheInner<T> {
    /// A waiter stopped awaiting the fetch of `generation`. The last one to
    /// leave cancels the request.
    fn detach(&self, generation: u64) {
        let abandoned = {
            let mut state = self.state.lock();
            match state.in_flight.as_mut() {
                Some(in_flight) if in_flight.generation == generation => {
                    in_flight.waiters = in_flight.waiters.saturating_sub(1);
                    if in_flight.waiters == 0 {
                        state.in_flight.take()
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };

        if let Some(in_flight) = abandoned {
            debug!(entity = %self.kind, generation, "Last waiter left, cancelling fetch");
            in_flight.token.cancel();
        }
    }
}

/// Registration of one caller on an in-flight fetch.
struct Waiter<T> {
    inner: Arc<CacheInner<T>>,
    generation: u64,
}

impl<T> Drop for Waiter<T> {
    fn drop(&mut self) {
        self.inner.detach(self.generation);
    }
}

impl<T> fmt::Debug for EntityCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &self.inner.kind)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
