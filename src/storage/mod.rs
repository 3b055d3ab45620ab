//! Storage Module
//!
//! The size-constrained key-value store every persisted blob lives in, plus
//! quota estimation over it.

mod backend;
mod file;
mod memory;
mod quota;

pub use backend::BackingStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use quota::{
    item_cost, QuotaEstimator, QuotaState, DEFAULT_QUOTA_BYTES, RESTRICTED_QUOTA_BYTES,
};

// == Persisted Keys ==
/// Chapter cache blob
pub const CHAPTER_CACHE_KEY: &str = "bibleChapterCache";
/// Translation cache blob
pub const TRANSLATION_CACHE_KEY: &str = "translationCache";
/// Application state blob
pub const READER_STATE_KEY: &str = "bibleReaderState";
/// AI question/answer history blob
pub const HISTORY_KEY: &str = "aiHistory";
