//! Request and Response models for the cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    HistoryRequest, PositionRequest, PruneRequest, PutChapterRequest, PutTranslationRequest,
    SettingsUpdate,
};
pub use responses::{
    ChapterResponse, ErrorResponse, HealthResponse, HistoryResponse, PruneResponse,
    StatsResponse, StoreStatsResponse, TranslationResponse, WriteResponse,
};
