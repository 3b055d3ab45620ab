//! Reader Service
//!
//! Cache-first access to chapter text and AI answers. Network clients are
//! supplied by the caller through [`ChapterFetcher`] and [`ModelClient`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{chapter_key, translation_key, ChapterCache, TranslationCache, Verse};
use crate::error::{CacheError, Result};
use crate::history::{HistoryEntry, HistoryList};

// == Collaborators ==
/// Client for the Bible-text API.
#[async_trait]
pub trait ChapterFetcher: Send + Sync {
    async fn fetch_chapter(&self, book: &str, chapter: u32, version: &str) -> Result<Vec<Verse>>;
}

/// Client for the completion API. Token and cost accounting stay on its side.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn query_model(&self, prompt: &str, context: &str) -> Result<String>;
}

// == Cache Status ==
/// How a result relates to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from the cache
    Hit,
    /// Fetched and written to the cache
    Stored,
    /// Fetched, but caching failed; the value is valid, persistence is not
    Degraded(String),
}

impl CacheStatus {
    fn from_write(result: Result<()>) -> Result<Self> {
        match result {
            Ok(()) => Ok(CacheStatus::Stored),
            Err(e @ CacheError::CachePersistFailure { .. }) => {
                warn!("Caching degraded: {}", e);
                Ok(CacheStatus::Degraded(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Recency writes are best effort: a hit stays a hit.
    fn from_touch(key: &str, result: Result<bool>) -> Result<Self> {
        match result {
            Ok(_) => Ok(CacheStatus::Hit),
            Err(e @ CacheError::CachePersistFailure { .. }) => {
                warn!("Could not persist recency of '{}': {}", key, e);
                Ok(CacheStatus::Hit)
            }
            Err(e) => Err(e),
        }
    }
}

/// Chapter text plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterLoad {
    pub key: String,
    pub verses: Vec<Verse>,
    pub cache: CacheStatus,
}

/// Model answer plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub key: String,
    pub text: String,
    pub cache: CacheStatus,
    /// Whether this call saved the answer into the persisted AI history
    pub recorded: bool,
}

// == Reader ==
/// Ties the caches and history to the network collaborators.
///
/// Store locks are never held across a collaborator call.
#[derive(Debug, Clone)]
pub struct Reader {
    chapters: Arc<RwLock<ChapterCache>>,
    translations: Arc<RwLock<TranslationCache>>,
    history: Arc<RwLock<HistoryList>>,
}

impl Reader {
    pub fn new(
        chapters: Arc<RwLock<ChapterCache>>,
        translations: Arc<RwLock<TranslationCache>>,
        history: Arc<RwLock<HistoryList>>,
    ) -> Self {
        Self {
            chapters,
            translations,
            history,
        }
    }

    // == Load Chapter ==
    /// Returns a chapter from the cache, or fetches and caches it.
    ///
    /// A hit counts as a use and refreshes the entry's recency. Fetch errors
    /// propagate unchanged.
    pub async fn load_chapter(
        &self,
        fetcher: &dyn ChapterFetcher,
        book: &str,
        chapter: u32,
        version: &str,
    ) -> Result<ChapterLoad> {
        let key = chapter_key(book, chapter, version);

        {
            let mut cache = self.chapters.write().await;
            if let Some(verses) = cache.get(&key) {
                debug!("Chapter cache hit for '{}'", key);
                let status = CacheStatus::from_touch(&key, cache.touch(&key))?;
                return Ok(ChapterLoad {
                    key,
                    verses,
                    cache: status,
                });
            }
        }

        debug!("Chapter cache miss for '{}', fetching", key);
        let verses = fetcher.fetch_chapter(book, chapter, version).await?;

        let written = self.chapters.write().await.put(key.clone(), verses.clone());
        Ok(ChapterLoad {
            key,
            verses,
            cache: CacheStatus::from_write(written)?,
        })
    }

    // == Ask ==
    /// Answers a question about a passage, from the cache when possible.
    ///
    /// A hit refreshes the entry's recency. Fresh answers are cached and
    /// appended to the AI history; a failed history write is logged and the
    /// answer is still returned with `recorded` false.
    pub async fn ask(
        &self,
        client: &dyn ModelClient,
        model: &str,
        verse: &str,
        question: &str,
        context: &str,
    ) -> Result<Answer> {
        let key = translation_key(model, verse, question);

        {
            let mut cache = self.translations.write().await;
            if let Some(text) = cache.get(&key) {
                debug!("Translation cache hit for '{}'", key);
                let status = CacheStatus::from_touch(&key, cache.touch(&key))?;
                return Ok(Answer {
                    key,
                    text,
                    cache: status,
                    recorded: false,
                });
            }
        }

        let text = client.query_model(question, context).await?;

        let written = self.translations.write().await.put(key.clone(), text.clone());
        let cache = CacheStatus::from_write(written)?;

        let entry = HistoryEntry::new(question, text.clone(), context);
        let recorded = match self.history.write().await.append(entry) {
            Ok(()) => true,
            Err(e) => {
                warn!("Answer for '{}' not added to history: {}", key, e);
                false
            }
        };

        Ok(Answer {
            key,
            text,
            cache,
            recorded,
        })
    }
}
