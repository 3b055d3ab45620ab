//! Bible Cache - persistent cache core for a Bible reading app
//!
//! Quota-aware chapter and translation caches with LRU pruning and retrying
//! persistence, plus the AI history list and reader state that share the same
//! backing store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod reader;
pub mod state;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use reader::{CacheStatus, ChapterFetcher, ModelClient, Reader};
pub use tasks::spawn_quota_monitor;
