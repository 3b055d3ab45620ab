//! File Backing Store
//!
//! A [`MemoryStore`] mirrored to a single JSON file after every successful write.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::{BackingStore, MemoryStore};
use crate::error::{CacheError, Result};

// == File Store ==
/// Backing store persisted to `path` as a JSON object of string values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    /// Held from the in-memory change until its snapshot is on disk
    flush_lock: Mutex<()>,
}

impl FileStore {
    // == Open ==
    /// Opens the store at `path`, loading existing contents.
    ///
    /// A missing file opens empty. A malformed file is logged and also opens
    /// empty; it is overwritten by the next successful write.
    pub fn open(path: impl AsRef<Path>, limit_bytes: Option<u64>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(items) => {
                    info!("Loaded {} stored keys from {}", items.len(), path.display());
                    items
                }
                Err(e) => {
                    warn!(
                        "Backing file {} is malformed ({}), starting empty",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No backing file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            inner: MemoryStore::with_items(items, limit_bytes),
            flush_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Apply ==
    /// Sets (`Some`) or removes (`None`) `key`, then flushes.
    ///
    /// When the flush fails the in-memory value is restored, so memory never
    /// holds a change the file does not.
    fn apply(&self, key: &str, value: Option<&str>) -> Result<()> {
        let _guard = self
            .flush_lock
            .lock()
            .map_err(|_| CacheError::Internal("file store flush lock poisoned".to_string()))?;

        let previous = self.inner.get_item(key)?;
        match value {
            Some(value) => self.inner.set_item(key, value)?,
            None => self.inner.remove_item(key)?,
        }

        if let Err(e) = self.flush() {
            let restored = match previous {
                Some(old) => self.inner.set_item(key, &old),
                None => self.inner.remove_item(key),
            };
            if let Err(restore_err) = restored {
                warn!("Could not roll back '{}': {}", key, restore_err);
            }
            warn!("Flush to {} failed: {}", self.path.display(), e);
            return Err(e);
        }
        Ok(())
    }

    // == Flush ==
    /// Caller holds `flush_lock`.
    fn flush(&self) -> Result<()> {
        // Sorted for stable diffs of the file
        let snapshot: BTreeMap<String, String> = self.inner.items()?.into_iter().collect();
        let json = serde_json::to_string(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl BackingStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.apply(key, Some(value))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.apply(key, None)
    }

    fn items(&self) -> Result<Vec<(String, String)>> {
        self.inner.items()
    }
}
