//! Reader State Module
//!
//! Persisted application state: current position, Bible version and the one
//! canonical settings record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::DEFAULT_MAX_HISTORY_LENGTH;
use crate::error::Result;
use crate::storage::{BackingStore, READER_STATE_KEY};

// == Verse Reference ==
/// Position in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRef {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

// == Settings ==
/// User settings for the reader and the AI assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Model used for questions and translations
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Bound of the AI history list
    pub max_history_length: usize,
    pub font_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            font_size: 16,
        }
    }
}

// == Reader State ==
/// Everything persisted under the state key.
///
/// Unknown top-level keys are kept so older or newer clients lose nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderState {
    pub current_verse: VerseRef,
    pub bible_version: String,
    pub settings: Settings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            current_verse: VerseRef::new("Genesis", 1, 1),
            bible_version: "kjv".to_string(),
            settings: Settings::default(),
            extra: Map::new(),
        }
    }
}

// == Merge Defaults ==
/// Fills keys absent (or null) in `persisted` from `defaults`, recursing into
/// nested objects. Values present in `persisted` always win.
pub fn merge_defaults(defaults: Value, persisted: Value) -> Value {
    match (defaults, persisted) {
        (Value::Object(defaults), Value::Object(mut persisted)) => {
            for (key, default) in defaults {
                let merged = match persisted.remove(&key) {
                    Some(Value::Null) | None => default,
                    Some(value) => merge_defaults(default, value),
                };
                persisted.insert(key, merged);
            }
            Value::Object(persisted)
        }
        (default, Value::Null) => default,
        (_, persisted) => persisted,
    }
}

// == State Store ==
/// Owner of the persisted [`ReaderState`].
#[derive(Debug)]
pub struct StateStore {
    state: ReaderState,
    defaults: ReaderState,
    backend: Arc<dyn BackingStore>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn BackingStore>) -> Self {
        Self::with_defaults(ReaderState::default(), backend)
    }

    pub fn with_defaults(defaults: ReaderState, backend: Arc<dyn BackingStore>) -> Self {
        Self {
            state: defaults.clone(),
            defaults,
            backend,
        }
    }

    // == Load ==
    /// Reads the persisted state merged onto the defaults.
    ///
    /// Falls back to the defaults when nothing is stored or the blob cannot
    /// be read. Returns true when persisted state was used.
    pub fn load(&mut self) -> bool {
        let raw = match self.backend.get_item(READER_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.state = self.defaults.clone();
                return false;
            }
            Err(e) => {
                warn!("Could not read reader state, using defaults: {}", e);
                self.state = self.defaults.clone();
                return false;
            }
        };

        match self.merge_persisted(&raw) {
            Ok(state) => {
                self.state = state;
                info!("Reader state restored at {}", self.state.current_verse);
                true
            }
            Err(e) => {
                warn!("Discarding malformed reader state: {}", e);
                self.state = self.defaults.clone();
                false
            }
        }
    }

    fn merge_persisted(&self, raw: &str) -> serde_json::Result<ReaderState> {
        let persisted: Value = serde_json::from_str(raw)?;
        let defaults = serde_json::to_value(&self.defaults)?;
        serde_json::from_value(merge_defaults(defaults, persisted))
    }

    // == Save ==
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        self.backend.set_item(READER_STATE_KEY, &json)
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Applies `update` to the settings and persists.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) -> Result<()> {
        update(&mut self.state.settings);
        self.save()
    }

    /// Moves the reading position and persists.
    pub fn set_position(&mut self, verse: VerseRef, bible_version: Option<String>) -> Result<()> {
        self.state.current_verse = verse;
        if let Some(version) = bible_version {
            self.state.bible_version = version;
        }
        self.save()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_merge_fills_missing_nested_keys() {
        let defaults = json!({
            "bibleVersion": "kjv",
            "settings": { "model": "m", "fontSize": 16, "maxTokens": 500 }
        });
        let persisted = json!({
            "settings": { "fontSize": 20 },
            "theme": "dark"
        });

        let merged = merge_defaults(defaults, persisted);

        assert_eq!(
            merged,
            json!({
                "bibleVersion": "kjv",
                "settings": { "model": "m", "fontSize": 20, "maxTokens": 500 },
                "theme": "dark"
            })
        );
    }

    #[test]
    fn test_merge_treats_null_as_absent() {
        let merged = merge_defaults(json!({ "a": 1 }), json!({ "a": null }));
        assert_eq!(merged, json!({ "a": 1 }));
    }

    #[test]
    fn test_load_without_blob_uses_defaults() {
        let mut store = StateStore::new(Arc::new(MemoryStore::new()));
        assert!(!store.load());
        assert_eq!(store.state(), &ReaderState::default());
    }

    #[test]
    fn test_load_merges_partial_settings() {
        let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::new());
        backend
            .set_item(
                READER_STATE_KEY,
                r#"{"currentVerse":{"book":"John","chapter":3,"verse":16},"settings":{"model":"gpt-4o"},"bookmarks":["John 3:16"]}"#,
            )
            .unwrap();

        let mut store = StateStore::new(backend);
        assert!(store.load());

        let state = store.state();
        assert_eq!(state.current_verse, VerseRef::new("John", 3, 16));
        assert_eq!(state.bible_version, "kjv");
        assert_eq!(state.settings.model, "gpt-4o");
        assert_eq!(state.settings.font_size, 16);
        assert_eq!(state.extra["bookmarks"], json!(["John 3:16"]));
    }

    #[test]
    fn test_malformed_state_uses_defaults() {
        let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::new());
        backend
            .set_item(READER_STATE_KEY, r#"{"currentVerse":"not a verse"}"#)
            .unwrap();

        let mut store = StateStore::new(backend);
        assert!(!store.load());
        assert_eq!(store.state(), &ReaderState::default());
    }

    #[test]
    fn test_updates_persist_and_reload() {
        let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::new());
        let mut store = StateStore::new(backend.clone());

        store
            .update_settings(|s| s.max_history_length = 25)
            .unwrap();
        store
            .set_position(VerseRef::new("Psalms", 23, 1), Some("web".to_string()))
            .unwrap();

        let mut reloaded = StateStore::new(backend);
        assert!(reloaded.load());
        assert_eq!(reloaded.settings().max_history_length, 25);
        assert_eq!(reloaded.state().bible_version, "web");
        assert_eq!(reloaded.state().current_verse.to_string(), "Psalms 23:1");
    }
}
