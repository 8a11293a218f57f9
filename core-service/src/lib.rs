//! Core service façade.
//!
//! This crate wires the host bridges carried by a [`CoreConfig`] into the
//! shared Rust core: one [`CatalogCache`], one [`Library`] and one
//! [`PlaybackSession`] per process, all publishing on a single [`EventBus`].
//! Screens receive these as `Arc` handles from the service instead of
//! reaching for globals.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let core = CoreService::new(CoreConfig::builder().build()?)?;
//! let songs = core.catalog().songs(Default::default()).await?;
//! core.playback().set_queue(songs.to_vec(), 0);
//! core.playback().play().await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::media::MediaEvent;
use core_library::{CatalogCache, Library};
use core_playback::{spawn_media_event_pump, PlaybackSession};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: CoreConfig,
    events: EventBus,
    catalog: Arc<CatalogCache>,
    library: Arc<Library>,
    playback: Arc<PlaybackSession>,
    media_pump: Mutex<Option<JoinHandle<()>>>,
}

impl CoreService {
    /// Create the service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);

        let catalog = Arc::new(CatalogCache::new(
            Arc::clone(&config.catalog_source),
            Arc::clone(&config.persistent_store),
            Arc::clone(&config.clock),
            config.cache_ttl,
            Some(events.clone()),
        ));

        let library = Arc::new(Library::new(
            Arc::clone(&config.catalog_source),
            Arc::clone(&catalog),
            config.library_snapshot_ttl,
        ));

        let playback = Arc::new(
            PlaybackSession::new(Arc::clone(&config.media_element), config.initial_volume)
                .with_events(events.clone()),
        );

        info!(
            api_base_url = %config.api_base_url,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Core service initialized"
        );

        Ok(Self {
            config,
            events,
            catalog,
            library,
            playback,
            media_pump: Mutex::new(None),
        })
    }

    /// Route the media element's notifications into the playback session.
    ///
    /// Must be called from within a tokio runtime. Attaching a new channel
    /// stops the previous pump.
    pub fn attach_media_events(&self, events: UnboundedReceiver<MediaEvent>) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "Media events require a running tokio runtime".to_string(),
            ));
        }

        let pump = spawn_media_event_pump(Arc::clone(&self.playback), events);
        if let Some(previous) = self.media_pump.lock().replace(pump) {
            previous.abort();
        }
        debug!("Media event pump attached");
        Ok(())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<CatalogCache> {
        Arc::clone(&self.catalog)
    }

    pub fn library(&self) -> Arc<Library> {
        Arc::clone(&self.library)
    }

    pub fn playback(&self) -> Arc<PlaybackSession> {
        Arc::clone(&self.playback)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Forget everything cached for the current user and stop playback.
    ///
    /// Removes every persisted collection and the library snapshot, so the
    /// next screen load goes to the network.
    pub fn logout(&self) {
        self.catalog.clear_all();
        self.library.clear_snapshot();
        self.playback.set_queue(Vec::new(), 0);
        info!("Logged out; caches wiped");
    }

    /// Pause playback and stop the media event pump.
    pub fn shutdown(&self) {
        self.playback.pause();
        if let Some(pump) = self.media_pump.lock().take() {
            pump.abort();
        }
        info!("Core service shut down");
    }
}

impl Drop for CoreService {
    fn drop(&mut self) {
        if let Some(pump) = self.media_pump.get_mut().take() {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("playback", &self.playback)
            .finish()
    }
}
