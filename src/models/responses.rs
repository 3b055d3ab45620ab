//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, Verse};
use crate::history::HistoryEntry;

/// Response body for GET /chapters/:key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub key: String,
    pub verses: Vec<Verse>,
    /// Epoch millis of the last use
    pub last_loaded: Option<u64>,
}

/// Response body for GET /translations/:key
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResponse {
    pub key: String,
    pub response: String,
    pub timestamp: Option<u64>,
}

/// Response body for writes that succeeded (PUT and touch)
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// The key that was written
    pub key: String,
}

impl WriteResponse {
    pub fn stored(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
        }
    }

    pub fn touched(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' refreshed", key),
            key,
        }
    }
}

/// Response body for the prune endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    /// Entries evicted by this request
    pub evicted: usize,
    /// Entries left in the store
    pub remaining: usize,
}

/// Response body for GET /history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub max_length: usize,
}

/// Per-store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub persist_retries: u64,
    pub persist_failures: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StoreStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            persist_retries: stats.persist_retries,
            persist_failures: stats.persist_failures,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub chapters: StoreStatsResponse,
    pub translations: StoreStatsResponse,
}

impl StatsResponse {
    pub fn new(chapters: CacheStats, translations: CacheStats) -> Self {
        Self {
            chapters: chapters.into(),
            translations: translations.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
