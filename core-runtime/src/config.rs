//! # Core Configuration Module
//!
//! Builder-based configuration for the Wavify core.
//!
//! ## Overview
//!
//! [`CoreConfig`] carries every tunable (API root, cache lifetimes, initial
//! volume) plus the host bridges the core runs against. The builder fails
//! fast: missing bridges and out-of-range values are reported from
//! [`CoreConfigBuilder::build`] instead of surfacing later as odd runtime
//! behavior.
//!
//! ## Bridges
//!
//! - `CatalogSource` - remote catalog API (desktop default: reqwest)
//! - `PersistentStore` - durable cache storage (desktop default: JSON files)
//! - `MediaElement` - audio output (desktop default: headless transport)
//! - `Clock` - always defaults to the system clock
//!
//! With the `desktop-shims` feature the desktop defaults are injected when a
//! bridge is not provided; without it a missing bridge is
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://wavifyserver.onrender.com/api/")
//!     .access_token(token)
//!     .cache_ttl(Duration::from_secs(60))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CatalogSource, Clock, MediaElement, PersistentStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default API root of the Wavify backend.
pub const DEFAULT_API_BASE_URL: &str = "https://wavifyserver.onrender.com/api/";

/// How long an in-memory collection is trusted without refetching.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// How long a persisted library snapshot stays valid.
pub const DEFAULT_LIBRARY_SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_VOLUME: f64 = 0.75;

pub use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Core configuration for the Wavify core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// API root, always ending with `/`
    pub api_base_url: String,

    /// Bearer token for authenticated endpoints
    pub access_token: Option<String>,

    /// Directory for the default persistent store
    pub data_dir: Option<PathBuf>,

    /// Memory cache lifetime for catalog collections
    pub cache_ttl: Duration,

    /// Lifetime of the persisted library snapshot
    pub library_snapshot_ttl: Duration,

    /// Volume applied to the media element at startup
    pub initial_volume: f64,

    /// Event bus buffer per subscriber
    pub event_buffer_size: usize,

    pub catalog_source: Arc<dyn CatalogSource>,

    pub persistent_store: Arc<dyn PersistentStore>,

    pub media_element: Arc<dyn MediaElement>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("data_dir", &self.data_dir)
            .field("cache_ttl", &self.cache_ttl)
            .field("library_snapshot_ttl", &self.library_snapshot_ttl)
            .field("initial_volume", &self.initial_volume)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("catalog_source", &"CatalogSource { ... }")
            .field("persistent_store", &"PersistentStore { ... }")
            .field("media_element", &"MediaElement { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - API base URL is an http(s) URL ending with `/`
    /// - Cache lifetimes are non-zero
    /// - Initial volume is within `[0.0, 1.0]`
    /// - Event buffer size is non-zero
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.api_base_url)?;

        if self.cache_ttl.is_zero() {
            return Err(Error::Config(
                "Cache TTL must be greater than zero".to_string(),
            ));
        }

        if self.library_snapshot_ttl.is_zero() {
            return Err(Error::Config(
                "Library snapshot TTL must be greater than zero".to_string(),
            ));
        }

        if !self.initial_volume.is_finite() || !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(Error::Config(format!(
                "Initial volume {} is outside [0.0, 1.0]",
                self.initial_volume
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::Config("API base URL cannot be empty".to_string()));
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must use http or https: {}",
            url
        )));
    }

    if !url.ends_with('/') {
        return Err(Error::Config(format!(
            "API base URL must end with '/': {}",
            url
        )));
    }

    Ok(())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_catalog_source(
    base_url: &str,
    access_token: Option<&String>,
) -> Result<Arc<dyn CatalogSource>> {
    use bridge_desktop::HttpCatalogSource;

    let source = HttpCatalogSource::new(base_url)?;
    source.set_access_token(access_token.cloned());
    Ok(Arc::new(source))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_catalog_source(
    _base_url: &str,
    _access_token: Option<&String>,
) -> Result<Arc<dyn CatalogSource>> {
    Err(Error::CapabilityMissing {
        capability: "CatalogSource".to_string(),
        message: "A CatalogSource implementation is required to load songs, artists, genres and playlists. \
                 Desktop: enable the 'desktop-shims' feature to use the reqwest-based HttpCatalogSource. \
                 Other hosts: inject a platform HTTP adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_persistent_store(data_dir: Option<&PathBuf>) -> Result<Arc<dyn PersistentStore>> {
    use bridge_desktop::JsonFileStore;

    let dir = data_dir.cloned().unwrap_or_else(JsonFileStore::default_dir);
    Ok(Arc::new(JsonFileStore::new(dir)?))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_persistent_store(_data_dir: Option<&PathBuf>) -> Result<Arc<dyn PersistentStore>> {
    Err(Error::CapabilityMissing {
        capability: "PersistentStore".to_string(),
        message: "A PersistentStore implementation is required for offline cache fallback. \
                 Desktop: enable the 'desktop-shims' feature to use JsonFileStore. \
                 Web: inject a localStorage-backed store. Tests: use InMemoryStore."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_element() -> Result<Arc<dyn MediaElement>> {
    Ok(Arc::new(bridge_desktop::SilentMediaElement::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_element() -> Result<Arc<dyn MediaElement>> {
    Err(Error::CapabilityMissing {
        capability: "MediaElement".to_string(),
        message: "A MediaElement implementation is required by the playback session. \
                 Inject the host's audio element adapter, or enable 'desktop-shims' \
                 for a headless transport."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    access_token: Option<String>,
    data_dir: Option<PathBuf>,
    cache_ttl: Option<Duration>,
    library_snapshot_ttl: Option<Duration>,
    initial_volume: Option<f64>,
    event_buffer_size: Option<usize>,
    catalog_source: Option<Arc<dyn CatalogSource>>,
    persistent_store: Option<Arc<dyn PersistentStore>>,
    media_element: Option<Arc<dyn MediaElement>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Sets the API root. Default: [`DEFAULT_API_BASE_URL`].
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the bearer token handed to the default catalog source.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the directory used by the default persistent store.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Default: 60 seconds.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Default: 5 minutes.
    pub fn library_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.library_snapshot_ttl = Some(ttl);
        self
    }

    /// Default: 0.75.
    pub fn initial_volume(mut self, volume: f64) -> Self {
        self.initial_volume = Some(volume);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.catalog_source = Some(source);
        self
    }

    pub fn persistent_store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.persistent_store = Some(store);
        self
    }

    pub fn media_element(mut self, media: Arc<dyn MediaElement>) -> Self {
        self.media_element = Some(media);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a value is out of range
    /// - [`Error::CapabilityMissing`] if a bridge is absent and no desktop
    ///   default is available
    pub fn build(self) -> Result<CoreConfig> {
        let api_base_url = self
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        // Check the URL before a default source is built against it.
        validate_base_url(&api_base_url)?;

        let catalog_source = match self.catalog_source {
            Some(source) => source,
            None => provide_default_catalog_source(&api_base_url, self.access_token.as_ref())?,
        };

        let persistent_store = match self.persistent_store {
            Some(store) => store,
            None => provide_default_persistent_store(self.data_dir.as_ref())?,
        };

        let media_element = match self.media_element {
            Some(media) => media,
            None => provide_default_media_element()?,
        };

        let config = CoreConfig {
            api_base_url,
            access_token: self.access_token,
            data_dir: self.data_dir,
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
            library_snapshot_ttl: self
                .library_snapshot_ttl
                .unwrap_or(DEFAULT_LIBRARY_SNAPSHOT_TTL),
            initial_volume: self.initial_volume.unwrap_or(DEFAULT_VOLUME),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            catalog_source,
            persistent_store,
            media_element,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;
        Ok(config)
    }
}
