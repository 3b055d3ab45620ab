//! Cache Module
//!
//! Persistent, quota-aware caches with recency-based eviction and
//! retry-on-full writes.

mod clock;
mod entry;
mod eviction;
mod keys;
mod policy;
pub mod retry;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, ChapterEntry, TranslationEntry, Verse};
pub use eviction::select_for_eviction;
pub use keys::{chapter_key, string_hash, translation_key};
pub use policy::{BatchSize, PrunePolicy};
pub use stats::CacheStats;
pub use store::{CacheStore, ChapterCache, TranslationCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Entries removed per pruning pass unless a policy says otherwise
pub const DEFAULT_PRUNE_BATCH: usize = 5;

/// Share of the store removed by proportional pruning passes
pub const DEFAULT_PRUNE_RATIO: f64 = 0.1;
