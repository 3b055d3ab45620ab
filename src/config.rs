//! Configuration Module
//!
//! Handles loading cache thresholds and server settings from environment variables.

use std::env;
use std::path::PathBuf;

// == Defaults ==
/// Maximum chapters kept in the chapter cache
pub const DEFAULT_CHAPTER_CAPACITY: usize = 100;
/// Maximum AI responses kept in the translation cache
pub const DEFAULT_TRANSLATION_CAPACITY: usize = 200;
/// Write attempts before a persist is reported as failed
pub const DEFAULT_MAX_PERSIST_ATTEMPTS: u32 = 5;
/// Usage ratio above which proactive pruning starts
pub const DEFAULT_QUOTA_THRESHOLD: f64 = 0.9;
/// Seconds between background quota checks
pub const DEFAULT_QUOTA_CHECK_INTERVAL: u64 = 60;
/// Maximum AI history entries
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 10;
/// Platform identifier used when none is configured
pub const DEFAULT_PLATFORM_ID: &str = "server";
/// Backing store file
pub const DEFAULT_DATA_FILE: &str = "bible_cache.json";
/// HTTP server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of chapters the chapter cache can hold
    pub chapter_capacity: usize,
    /// Maximum number of responses the translation cache can hold
    pub translation_capacity: usize,
    /// Write attempts per persist before giving up
    pub max_persist_attempts: u32,
    /// Usage ratio (0.0 - 1.0) that triggers quota pruning
    pub quota_threshold: f64,
    /// Background quota check interval in seconds
    pub quota_check_interval: u64,
    /// Maximum AI history length
    pub max_history_length: usize,
    /// Platform identifier used to pick the quota tier
    pub platform_id: String,
    /// Path of the JSON file backing the store
    pub data_file: PathBuf,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CHAPTER_CACHE_CAPACITY` - Chapter cache entries (default: 100)
    /// - `TRANSLATION_CACHE_CAPACITY` - Translation cache entries (default: 200)
    /// - `MAX_PERSIST_ATTEMPTS` - Write attempts per persist (default: 5)
    /// - `QUOTA_THRESHOLD` - Usage ratio that triggers pruning (default: 0.9)
    /// - `QUOTA_CHECK_INTERVAL` - Seconds between quota checks (default: 60)
    /// - `MAX_HISTORY_LENGTH` - AI history entries kept (default: 10)
    /// - `PLATFORM_ID` - Platform identifier for the quota tier (default: "server")
    /// - `DATA_FILE` - Backing store path (default: "bible_cache.json")
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            chapter_capacity: parse_var("CHAPTER_CACHE_CAPACITY")
                .unwrap_or(defaults.chapter_capacity),
            translation_capacity: parse_var("TRANSLATION_CACHE_CAPACITY")
                .unwrap_or(defaults.translation_capacity),
            max_persist_attempts: parse_var("MAX_PERSIST_ATTEMPTS")
                .unwrap_or(defaults.max_persist_attempts),
            quota_threshold: parse_var::<f64>("QUOTA_THRESHOLD")
                .filter(|t| *t > 0.0 && *t <= 1.0)
                .unwrap_or(defaults.quota_threshold),
            quota_check_interval: parse_var("QUOTA_CHECK_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.quota_check_interval),
            max_history_length: parse_var("MAX_HISTORY_LENGTH")
                .unwrap_or(defaults.max_history_length),
            platform_id: env::var("PLATFORM_ID").unwrap_or(defaults.platform_id),
            data_file: env::var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chapter_capacity: DEFAULT_CHAPTER_CAPACITY,
            translation_capacity: DEFAULT_TRANSLATION_CAPACITY,
            max_persist_attempts: DEFAULT_MAX_PERSIST_ATTEMPTS,
            quota_threshold: DEFAULT_QUOTA_THRESHOLD,
            quota_check_interval: DEFAULT_QUOTA_CHECK_INTERVAL,
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            platform_id: DEFAULT_PLATFORM_ID.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}
