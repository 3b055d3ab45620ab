//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{Verse, DEFAULT_PRUNE_BATCH};

/// Request body for PUT /chapters/:key
#[derive(Debug, Clone, Deserialize)]
pub struct PutChapterRequest {
    /// Verses of the chapter, as returned by the Bible API
    pub verses: Vec<Verse>,
}

/// Request body for PUT /translations/:key
#[derive(Debug, Clone, Deserialize)]
pub struct PutTranslationRequest {
    /// Model response text
    pub response: String,
}

impl PutTranslationRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.response.trim().is_empty() {
            return Some("Response cannot be empty".to_string());
        }
        None
    }
}

/// Request body for the prune endpoints. An empty body prunes one default batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PruneRequest {
    #[serde(default)]
    pub count: Option<usize>,
}

impl PruneRequest {
    pub fn count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_PRUNE_BATCH)
    }
}

/// Request body for POST /history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub context: String,
}

impl HistoryRequest {
    pub fn validate(&self) -> Option<String> {
        if self.question.trim().is_empty() {
            return Some("Question cannot be empty".to_string());
        }
        None
    }
}

/// Request body for PUT /state/verse
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    /// Switches the Bible version along with the position
    #[serde(default)]
    pub bible_version: Option<String>,
}

impl PositionRequest {
    pub fn validate(&self) -> Option<String> {
        if self.book.trim().is_empty() {
            return Some("Book cannot be empty".to_string());
        }
        if self.chapter == 0 || self.verse == 0 {
            return Some("Chapter and verse start at 1".to_string());
        }
        None
    }
}

/// Request body for PUT /settings. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub max_history_length: Option<usize>,
    pub font_size: Option<u32>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Option<String> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Some("Temperature must be between 0 and 2".to_string());
            }
        }
        if matches!(self.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Some("Model cannot be empty".to_string());
        }
        None
    }
}
