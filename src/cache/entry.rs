//! Cache Entry Module
//!
//! Entry shapes for the chapter and translation caches. Each carries its
//! payload plus the last-used timestamp that drives eviction.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

// == Cache Entry Trait ==
/// A persisted cache entry: a payload and a last-used timestamp.
///
/// Timestamps only move forward: [`touch`](CacheEntry::touch) with an older
/// time leaves the entry unchanged. An entry persisted without a timestamp
/// reports `0`, which makes it the first eviction candidate.
pub trait CacheEntry:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    /// Payload handed to and returned from the cache
    type Value: Clone + Debug + Send + Sync;

    /// Creates an entry last used at `now_ms`.
    fn new(value: Self::Value, now_ms: u64) -> Self;

    fn value(&self) -> &Self::Value;

    /// Last-used time in Unix milliseconds, `0` if never recorded.
    fn last_used(&self) -> u64;

    /// Marks the entry used at `now_ms`.
    fn touch(&mut self, now_ms: u64);
}

// == Verse ==
/// One verse of chapter text as returned by the Bible-text API.
///
/// Fields other than the verse number and text are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    #[serde(default)]
    pub verse: u32,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Verse {
    pub fn new(verse: u32, text: impl Into<String>) -> Self {
        Self {
            verse,
            text: text.into(),
            extra: Map::new(),
        }
    }
}

// == Chapter Entry ==
/// Chapter cache entry, persisted as `{ verses, lastLoaded }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub verses: Vec<Verse>,
    #[serde(
        rename = "lastLoaded",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_loaded: Option<u64>,
}

impl CacheEntry for ChapterEntry {
    type Value = Vec<Verse>;

    fn new(verses: Vec<Verse>, now_ms: u64) -> Self {
        Self {
            verses,
            last_loaded: Some(now_ms),
        }
    }

    fn value(&self) -> &Vec<Verse> {
        &self.verses
    }

    fn last_used(&self) -> u64 {
        self.last_loaded.unwrap_or(0)
    }

    fn touch(&mut self, now_ms: u64) {
        self.last_loaded = Some(self.last_used().max(now_ms));
    }
}

// == Translation Entry ==
/// Translation cache entry, persisted as `{ response, timestamp }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl CacheEntry for TranslationEntry {
    type Value = String;

    fn new(response: String, now_ms: u64) -> Self {
        Self {
            response,
            timestamp: Some(now_ms),
        }
    }

    fn value(&self) -> &String {
        &self.response
    }

    fn last_used(&self) -> u64 {
        self.timestamp.unwrap_or(0)
    }

    fn touch(&mut self, now_ms: u64) {
        self.timestamp = Some(self.last_used().max(now_ms));
    }
}
