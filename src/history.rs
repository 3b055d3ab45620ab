//! AI History Module
//!
//! Bounded, oldest-first list of AI questions and answers.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::{BackingStore, HISTORY_KEY};

// == History Entry ==
/// One question put to the model and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    /// Passage the question was asked about
    #[serde(default)]
    pub context: String,
}

impl HistoryEntry {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            context: context.into(),
        }
    }
}

// == History List ==
/// Append-only history trimmed from the front to `max_length`.
///
/// Every mutation is written to the backing store.
#[derive(Debug)]
pub struct HistoryList {
    entries: VecDeque<HistoryEntry>,
    max_length: usize,
    backend: Arc<dyn BackingStore>,
}

impl HistoryList {
    pub fn new(max_length: usize, backend: Arc<dyn BackingStore>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_length,
            backend,
        }
    }

    // == Load ==
    /// Replaces the entries with the persisted list, trimmed to the bound.
    ///
    /// A missing or malformed blob loads as empty. Returns the entry count.
    pub fn load(&mut self) -> usize {
        self.entries = match self.backend.get_item(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding malformed AI history: {}", e);
                VecDeque::new()
            }),
            Ok(None) => VecDeque::new(),
            Err(e) => {
                warn!("Could not read AI history: {}", e);
                VecDeque::new()
            }
        };
        self.trim();
        self.entries.len()
    }

    // == Append ==
    /// Adds an entry, drops the oldest ones past the bound and persists.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.push_back(entry);
        let dropped = self.trim();
        if dropped > 0 {
            debug!("AI history trimmed by {}", dropped);
        }
        self.save()
    }

    // == Set Max Length ==
    /// Changes the bound, trimming immediately when it shrinks.
    pub fn set_max_length(&mut self, max_length: usize) -> Result<()> {
        self.max_length = max_length;
        if self.trim() > 0 {
            self.save()?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        self.backend.set_item(HISTORY_KEY, &json)
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn trim(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.max_length);
        self.entries.drain(..excess);
        excess
    }
}
