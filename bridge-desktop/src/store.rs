//! Persistent Store backed by JSON files

use bridge_traits::{
    error::{BridgeError, Result},
    storage::PersistentStore,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// File-backed [`PersistentStore`].
///
/// Each key maps to `<dir>/<key>.json`. Writes go to a temporary sibling
/// first and are renamed into place so a crash never leaves a half-written
/// entry behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(BridgeError::Io)?;
        debug!(path = ?dir, "Opened persistent store");
        Ok(Self { dir })
    }

    /// Platform data directory for the app, e.g. `~/.local/share/wavify/cache`.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("wavify")
            .join("cache")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');

        if !valid {
            return Err(BridgeError::Storage(format!("Invalid storage key: {:?}", key)));
        }

        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl PersistentStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, value).map_err(BridgeError::Io)?;
        fs::rename(&tmp, &path).map_err(BridgeError::Io)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.dir).map_err(BridgeError::Io)? {
            let path = entry.map_err(BridgeError::Io)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}
