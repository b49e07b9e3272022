//! Caller-owned memo of loaded configurations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::builder::get_config;
use super::record::Record;
use super::ConfigError;

/// Memoizes loaded configurations by file path.
///
/// Nothing is cached implicitly: the caller owns the cache, decides which
/// path keys an entry, and decides when to drop it. Failed loads are not
/// stored.
#[derive(Debug)]
pub struct ConfigCache<T> {
    entries: Mutex<HashMap<PathBuf, Arc<T>>>,
}

impl<T> Default for ConfigCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ConfigCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `path`, loading it with [`get_config`] on a miss.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<T>, ConfigError>
    where
        T: Record + Default,
    {
        self.get_or_load_with(path, |path| {
            let mut target = T::default();
            get_config(path, &mut target)?;
            Ok(target)
        })
    }

    /// Returns the entry for `path`, calling `load` on a miss.
    ///
    /// The cache stays locked while `load` runs, so concurrent misses on the
    /// same cache load once.
    pub fn get_or_load_with<F>(&self, path: impl AsRef<Path>, load: F) -> Result<Arc<T>, ConfigError>
    where
        F: FnOnce(&Path) -> Result<T, ConfigError>,
    {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(path) {
            trace!(path = %path.display(), "config cache hit");
            return Ok(Arc::clone(entry));
        }

        let entry = Arc::new(load(path)?);
        entries.insert(path.to_path_buf(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Drops the entry for `path`, returning it if present.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> Option<Arc<T>> {
        self.entries.lock().remove(path.as_ref())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
