//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    append_history_handler, clear_history_handler, get_chapter_handler, get_history_handler,
    get_state_handler, get_translation_handler, health_handler, prune_chapters_handler,
    prune_translations_handler, put_chapter_handler, put_translation_handler, quota_handler,
    set_position_handler, stats_handler, touch_chapter_handler, touch_translation_handler,
    update_settings_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: the browser UI is served from a different origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chapters/prune", post(prune_chapters_handler))
        .route(
            "/chapters/:key",
            get(get_chapter_handler).put(put_chapter_handler),
        )
        .route("/chapters/:key/touch", post(touch_chapter_handler))
        .route("/translations/prune", post(prune_translations_handler))
        .route(
            "/translations/:key",
            get(get_translation_handler).put(put_translation_handler),
        )
        .route("/translations/:key/touch", post(touch_translation_handler))
        .route("/quota", get(quota_handler))
        .route(
            "/history",
            get(get_history_handler)
                .post(append_history_handler)
                .delete(clear_history_handler),
        )
        .route("/state", get(get_state_handler))
        .route("/state/verse", put(set_position_handler))
        .route("/settings", put(update_settings_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
