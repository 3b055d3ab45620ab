//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheStore, ChapterCache, PrunePolicy, TranslationCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::history::{HistoryEntry, HistoryList};
use crate::models::{
    ChapterResponse, HealthResponse, HistoryRequest, HistoryResponse, PositionRequest,
    PruneRequest, PruneResponse, PutChapterRequest, PutTranslationRequest, SettingsUpdate,
    StatsResponse, TranslationResponse, WriteResponse,
};
use crate::state::{ReaderState, Settings, StateStore, VerseRef};
use crate::storage::{
    BackingStore, QuotaEstimator, QuotaState, CHAPTER_CACHE_KEY, TRANSLATION_CACHE_KEY,
};

/// Application state shared across all handlers.
///
/// Every store sits behind its own lock, which is the single-writer gate for
/// that store.
#[derive(Clone)]
pub struct AppState {
    pub chapters: Arc<RwLock<ChapterCache>>,
    pub translations: Arc<RwLock<TranslationCache>>,
    pub history: Arc<RwLock<HistoryList>>,
    pub state: Arc<RwLock<StateStore>>,
}

impl AppState {
    /// Creates a new AppState from already constructed stores.
    pub fn new(
        chapters: ChapterCache,
        translations: TranslationCache,
        history: HistoryList,
        state: StateStore,
    ) -> Self {
        Self {
            chapters: Arc::new(RwLock::new(chapters)),
            translations: Arc::new(RwLock::new(translations)),
            history: Arc::new(RwLock::new(history)),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Creates every store on one backing store, tuned from configuration.
    pub fn from_config(config: &Config, backend: Arc<dyn BackingStore>) -> Self {
        let estimator = QuotaEstimator::for_platform(&config.platform_id);

        let chapter_policy = PrunePolicy::chapters(config.chapter_capacity)
            .with_quota_threshold(config.quota_threshold)
            .with_max_attempts(config.max_persist_attempts);
        let translation_policy = PrunePolicy::translations(config.translation_capacity)
            .with_quota_threshold(config.quota_threshold)
            .with_max_attempts(config.max_persist_attempts);

        let chapters = CacheStore::new(CHAPTER_CACHE_KEY, chapter_policy, backend.clone())
            .with_estimator(estimator);
        let translations =
            CacheStore::new(TRANSLATION_CACHE_KEY, translation_policy, backend.clone())
                .with_estimator(estimator);

        Self::new(
            chapters,
            translations,
            HistoryList::new(config.max_history_length, backend.clone()),
            StateStore::new(backend),
        )
    }

    /// Restores every store from the backing store.
    ///
    /// The history bound follows the persisted settings.
    pub async fn load(&self) -> Result<()> {
        let max_history_length = {
            let mut state = self.state.write().await;
            state.load();
            state.settings().max_history_length
        };

        let chapters = self.chapters.write().await.load();
        let translations = self.translations.write().await.load();

        let mut history = self.history.write().await;
        history.set_max_length(max_history_length)?;
        let history_entries = history.load();

        info!(
            "Stores loaded: {} chapters, {} translations, {} history entries",
            chapters, translations, history_entries
        );
        Ok(())
    }
}

// == Chapters ==
/// Handler for GET /chapters/:key
pub async fn get_chapter_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ChapterResponse>> {
    // Write lock: lookups update stats
    let mut chapters = state.chapters.write().await;
    let verses = chapters
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let last_loaded = chapters.last_used(&key);

    Ok(Json(ChapterResponse {
        key,
        verses,
        last_loaded,
    }))
}

/// Handler for PUT /chapters/:key
pub async fn put_chapter_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PutChapterRequest>,
) -> Result<Json<WriteResponse>> {
    state.chapters.write().await.put(key.clone(), req.verses)?;
    Ok(Json(WriteResponse::stored(key)))
}

/// Handler for POST /chapters/:key/touch
///
/// Marks a chapter as used without returning its text.
pub async fn touch_chapter_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WriteResponse>> {
    if !state.chapters.write().await.touch(&key)? {
        return Err(CacheError::NotFound(key));
    }
    Ok(Json(WriteResponse::touched(key)))
}

/// Handler for POST /chapters/prune
pub async fn prune_chapters_handler(
    State(state): State<AppState>,
    body: Option<Json<PruneRequest>>,
) -> Result<Json<PruneResponse>> {
    let count = body.map(|Json(req)| req).unwrap_or_default().count();

    let mut chapters = state.chapters.write().await;
    let evicted = chapters.prune_now(count)?;

    Ok(Json(PruneResponse {
        evicted,
        remaining: chapters.len(),
    }))
}

// == Translations ==
/// Handler for GET /translations/:key
pub async fn get_translation_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TranslationResponse>> {
    let mut translations = state.translations.write().await;
    let response = translations
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let timestamp = translations.last_used(&key);

    Ok(Json(TranslationResponse {
        key,
        response,
        timestamp,
    }))
}

/// Handler for PUT /translations/:key
pub async fn put_translation_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PutTranslationRequest>,
) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .translations
        .write()
        .await
        .put(key.clone(), req.response)?;
    Ok(Json(WriteResponse::stored(key)))
}

/// Handler for POST /translations/:key/touch
///
/// Marks a cached response as used so pruning keeps it longer.
pub async fn touch_translation_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WriteResponse>> {
    if !state.translations.write().await.touch(&key)? {
        return Err(CacheError::NotFound(key));
    }
    Ok(Json(WriteResponse::touched(key)))
}

/// Handler for POST /translations/prune
pub async fn prune_translations_handler(
    State(state): State<AppState>,
    body: Option<Json<PruneRequest>>,
) -> Result<Json<PruneResponse>> {
    let count = body.map(|Json(req)| req).unwrap_or_default().count();

    let mut translations = state.translations.write().await;
    let evicted = translations.prune_now(count)?;

    Ok(Json(PruneResponse {
        evicted,
        remaining: translations.len(),
    }))
}

// == Quota ==
/// Handler for GET /quota
///
/// Usage covers the whole backing store, not only the chapter cache.
pub async fn quota_handler(State(state): State<AppState>) -> Result<Json<QuotaState>> {
    let chapters = state.chapters.read().await;
    Ok(Json(chapters.quota_state()?))
}

// == History ==
/// Handler for GET /history
pub async fn get_history_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    let history = state.history.read().await;
    Json(HistoryResponse {
        entries: history.entries().cloned().collect(),
        max_length: history.max_length(),
    })
}

/// Handler for POST /history
pub async fn append_history_handler(
    State(state): State<AppState>,
    Json(req): Json<HistoryRequest>,
) -> Result<Json<HistoryResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut history = state.history.write().await;
    history.append(HistoryEntry::new(req.question, req.answer, req.context))?;

    Ok(Json(HistoryResponse {
        entries: history.entries().cloned().collect(),
        max_length: history.max_length(),
    }))
}

/// Handler for DELETE /history
pub async fn clear_history_handler(State(state): State<AppState>) -> Result<Json<HistoryResponse>> {
    let mut history = state.history.write().await;
    history.clear()?;

    Ok(Json(HistoryResponse {
        entries: Vec::new(),
        max_length: history.max_length(),
    }))
}

// == Reader State ==
/// Handler for GET /state
pub async fn get_state_handler(State(state): State<AppState>) -> Json<ReaderState> {
    Json(state.state.read().await.state().clone())
}

/// Handler for PUT /state/verse
pub async fn set_position_handler(
    State(state): State<AppState>,
    Json(req): Json<PositionRequest>,
) -> Result<Json<ReaderState>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut store = state.state.write().await;
    store.set_position(
        VerseRef::new(req.book, req.chapter, req.verse),
        req.bible_version,
    )?;

    Ok(Json(store.state().clone()))
}

/// Handler for PUT /settings
///
/// A new history length trims the history list right away.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> Result<Json<Settings>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let settings = {
        let mut store = state.state.write().await;
        store.update_settings(|settings| {
            if let Some(model) = req.model {
                settings.model = model;
            }
            if let Some(temperature) = req.temperature {
                settings.temperature = temperature;
            }
            if let Some(max_tokens) = req.max_tokens {
                settings.max_tokens = max_tokens;
            }
            if let Some(max_history_length) = req.max_history_length {
                settings.max_history_length = max_history_length;
            }
            if let Some(font_size) = req.font_size {
                settings.font_size = font_size;
            }
        })?;
        store.settings().clone()
    };

    if req.max_history_length.is_some() {
        state
            .history
            .write()
            .await
            .set_max_length(settings.max_history_length)?;
    }

    Ok(Json(settings))
}

// == Stats & Health ==
/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let chapters = state.chapters.read().await.stats();
    let translations = state.translations.read().await.stats();

    Json(StatsResponse::new(chapters, translations))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Verse;
    use crate::storage::MemoryStore;

    fn test_state() -> AppState {
        AppState::from_config(&Config::default(), Arc::new(MemoryStore::new()))
    }

    fn verses() -> PutChapterRequest {
        PutChapterRequest {
            verses: vec![Verse::new(1, "The LORD is my shepherd")],
        }
    }

    #[tokio::test]
    async fn test_put_and_get_chapter() {
        let state = test_state();

        let result = put_chapter_handler(
            State(state.clone()),
            Path("Psalms-23-kjv".to_string()),
            Json(verses()),
        )
        .await;
        assert!(result.is_ok());

        let response = get_chapter_handler(State(state), Path("Psalms-23-kjv".to_string()))
            .await
            .unwrap();
        assert_eq!(response.verses[0].text, "The LORD is my shepherd");
        assert!(response.last_loaded.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_chapter() {
        let result = get_chapter_handler(State(test_state()), Path("nope".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_touch_missing_chapter() {
        let result = touch_chapter_handler(State(test_state()), Path("nope".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_prune_chapters_default_batch() {
        let state = test_state();
        for i in 1..=8 {
            let _ = put_chapter_handler(
                State(state.clone()),
                Path(format!("Psalms-{}-kjv", i)),
                Json(verses()),
            )
            .await
            .unwrap();
        }

        let response = prune_chapters_handler(State(state), None).await.unwrap();
        assert_eq!(response.evicted, 5);
        assert_eq!(response.remaining, 3);
    }

    #[tokio::test]
    async fn test_translation_roundtrip_and_validation() {
        let state = test_state();

        let empty = PutTranslationRequest {
            response: String::new(),
        };
        let result =
            put_translation_handler(State(state.clone()), Path("k".to_string()), Json(empty)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        let req = PutTranslationRequest {
            response: "Car Dieu a tant aimé le monde".to_string(),
        };
        let stored =
            put_translation_handler(State(state.clone()), Path("k".to_string()), Json(req))
                .await
                .unwrap();
        assert_eq!(stored.key, "k");

        let response = get_translation_handler(State(state), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(response.response, "Car Dieu a tant aimé le monde");
    }

    #[tokio::test]
    async fn test_touch_translation() {
        let state = test_state();
        let req = PutTranslationRequest {
            response: "Au commencement".to_string(),
        };
        let _ =
            put_translation_handler(State(state.clone()), Path("k".to_string()), Json(req))
                .await
                .unwrap();
        let before = state.translations.read().await.last_used("k").unwrap();

        let touched = touch_translation_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert!(touched.message.contains("refreshed"));
        assert!(state.translations.read().await.last_used("k").unwrap() >= before);

        let missing = touch_translation_handler(State(state), Path("nope".to_string())).await;
        assert!(matches!(missing, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_settings_shrink_history() {
        let state = test_state();
        for i in 0..6 {
            let req = HistoryRequest {
                question: format!("q{}", i),
                answer: "a".to_string(),
                context: String::new(),
            };
            let _ = append_history_handler(State(state.clone()), Json(req))
                .await
                .unwrap();
        }

        let update = SettingsUpdate {
            max_history_length: Some(2),
            ..Default::default()
        };
        let settings = update_settings_handler(State(state.clone()), Json(update))
            .await
            .unwrap();
        assert_eq!(settings.max_history_length, 2);

        let history = get_history_handler(State(state)).await;
        let questions: Vec<_> = history.entries.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["q4", "q5"]);
        assert_eq!(history.max_length, 2);
    }

    #[tokio::test]
    async fn test_set_position() {
        let state = test_state();
        let req = PositionRequest {
            book: "Romans".to_string(),
            chapter: 8,
            verse: 28,
            bible_version: None,
        };

        let response = set_position_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.current_verse, VerseRef::new("Romans", 8, 28));
        assert_eq!(response.bible_version, "kjv");
    }

    #[tokio::test]
    async fn test_load_applies_persisted_history_length() {
        let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::new());
        {
            let state = AppState::from_config(&Config::default(), backend.clone());
            let settings = update_settings_handler(
                State(state),
                Json(SettingsUpdate {
                    max_history_length: Some(3),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
            assert_eq!(settings.max_history_length, 3);
        }

        let state = AppState::from_config(&Config::default(), backend);
        state.load().await.unwrap();
        assert_eq!(state.history.read().await.max_length(), 3);
    }

    #[tokio::test]
    async fn test_stats_and_health() {
        let state = test_state();
        let _ = get_chapter_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.chapters.misses, 1);
        assert_eq!(response.translations.misses, 0);

        assert_eq!(health_handler().await.status, "healthy");
    }
}
