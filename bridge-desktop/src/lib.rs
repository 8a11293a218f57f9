//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `CatalogSource` using `reqwest` against the Wavify REST API
//! - `PersistentStore` as one JSON file per key under the platform data dir
//! - `MediaElement` as a headless transport for hosts without audio output
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpCatalogSource, JsonFileStore, DEFAULT_API_BASE_URL};
//!
//! let source = HttpCatalogSource::new(DEFAULT_API_BASE_URL)?;
//! source.set_access_token(Some(token));
//! let store = JsonFileStore::new(JsonFileStore::default_dir())?;
//! ```

mod http;
mod media;
mod store;

pub use http::{HttpCatalogSource, RetryPolicy, DEFAULT_API_BASE_URL};
pub use media::SilentMediaElement;
pub use store::JsonFileStore;
