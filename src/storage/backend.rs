//! Backing Store Trait
//!
//! One global namespace of string keys shared by every logical store.

use std::fmt::Debug;

use crate::error::Result;

// == Backing Store ==
/// Persistent string key-value store with a size ceiling.
///
/// Implementations must report a full store as
/// [`CacheError::StoreQuotaExceeded`](crate::error::CacheError::StoreQuotaExceeded)
/// and leave the previous value in place when a write is refused.
pub trait BackingStore: Send + Sync + Debug {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Snapshot of every stored pair.
    fn items(&self) -> Result<Vec<(String, String)>>;
}
