//! In-Memory Backing Store
//!
//! Mutex-guarded map with an optional byte ceiling.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{item_cost, BackingStore};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Backing store held in process memory.
///
/// When a limit is set, writes that would push the estimated usage above it
/// are refused with `StoreQuotaExceeded`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    limit_bytes: Option<u64>,
}

impl MemoryStore {
    // == Constructors ==
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store refusing writes past `limit_bytes`.
    pub fn with_limit(limit_bytes: u64) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            limit_bytes: Some(limit_bytes),
        }
    }

    /// Creates a store pre-populated with `items`.
    ///
    /// The limit is not checked against the seed data.
    pub fn with_items(items: HashMap<String, String>, limit_bytes: Option<u64>) -> Self {
        Self {
            items: Mutex::new(items),
            limit_bytes,
        }
    }

    /// Returns the configured ceiling, if any.
    pub fn limit_bytes(&self) -> Option<u64> {
        self.limit_bytes
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| CacheError::Internal("memory store lock poisoned".to_string()))
    }
}

impl BackingStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;

        if let Some(limit) = self.limit_bytes {
            let usage: u64 = items.iter().map(|(k, v)| item_cost(k, v)).sum();
            let replaced = items.get(key).map(|old| item_cost(key, old)).unwrap_or(0);
            let projected = usage - replaced + item_cost(key, value);

            if projected > limit {
                debug!(
                    "Refusing write of '{}': {} bytes projected, limit {}",
                    key, projected, limit
                );
                return Err(CacheError::StoreQuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn items(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
