//! Error types for the cache core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache core and its HTTP surface.
///
/// A cache miss is not an error: lookups return `Option`. `NotFound` only
/// exists for the HTTP layer, which must answer 404 for an absent key.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing store refused a write because it is full
    #[error("Storage quota exceeded while writing '{key}'")]
    StoreQuotaExceeded { key: String },

    /// A cache write still failed after every retry was spent
    #[error("Failed to persist {store} after {attempts} attempts: {reason}")]
    CachePersistFailure {
        store: String,
        attempts: u32,
        reason: String,
    },

    /// A persisted blob could not be decoded
    #[error("Invalid persisted entry: {0}")]
    InvalidEntry(String),

    /// Backing store I/O failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream collaborator (chapter fetch or model query) failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the error kind that the persist retry loop recovers from.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, CacheError::StoreQuotaExceeded { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreQuotaExceeded { .. } | CacheError::CachePersistFailure { .. } => {
                StatusCode::INSUFFICIENT_STORAGE
            }
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidEntry(_)
            | CacheError::Io(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache core.
pub type Result<T> = std::result::Result<T, CacheError>;
