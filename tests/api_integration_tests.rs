//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, persistence across a
//! restart, and one request against a live server.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bible_cache::{
    api::create_router,
    storage::{BackingStore, FileStore, MemoryStore, CHAPTER_CACHE_KEY},
    AppState, Config,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_app_with(Config::default(), Arc::new(MemoryStore::new()))
}

fn create_app_with(config: Config, backend: Arc<dyn BackingStore>) -> Router {
    create_router(AppState::from_config(&config, backend))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

fn chapter_body(text: &str) -> String {
    format!(r#"{{"verses":[{{"verse":1,"text":"{}","book_name":"Genesis"}}]}}"#, text)
}

fn temp_data_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "bible_cache_it_{}_{}.json",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

// == Chapter Endpoint Tests ==

#[tokio::test]
async fn test_chapter_put_then_get() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json("PUT", "/chapters/Genesis-1-kjv", chapter_body("In the beginning")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("Genesis-1-kjv"));

    let response = app.oneshot(get("/chapters/Genesis-1-kjv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["verses"][0]["text"], "In the beginning");
    // Unknown verse fields survive the cache
    assert_eq!(json["verses"][0]["book_name"], "Genesis");
    assert!(json["lastLoaded"].as_u64().is_some());
}

#[tokio::test]
async fn test_chapter_touch() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json("POST", "/chapters/Exodus-3-kjv/touch", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(send_json("PUT", "/chapters/Exodus-3-kjv", chapter_body("Moses")))
        .await
        .unwrap();

    let response = app
        .oneshot(send_json("POST", "/chapters/Exodus-3-kjv/touch", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_capacity_evicts_least_recent_chapter() {
    let config = Config {
        chapter_capacity: 3,
        ..Config::default()
    };
    let app = create_app_with(config, Arc::new(MemoryStore::new()));

    for key in ["A", "B", "C", "D"] {
        let response = app
            .clone()
            .oneshot(send_json("PUT", &format!("/chapters/{}", key), chapter_body(key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/chapters/A")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for key in ["B", "C", "D"] {
        let response = app
            .clone()
            .oneshot(get(&format!("/chapters/{}", key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["chapters"]["total_entries"], 3);
    assert_eq!(json["chapters"]["evictions"], 1);
}

#[tokio::test]
async fn test_prune_chapters_with_count() {
    let app = create_test_app();
    for i in 1..=4 {
        app.clone()
            .oneshot(send_json("PUT", &format!("/chapters/Mark-{}-kjv", i), chapter_body("text")))
            .await
            .unwrap();
    }

    let response = app
        .oneshot(send_json("POST", "/chapters/prune", r#"{"count":3}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["evicted"], 3);
    assert_eq!(json["remaining"], 1);
}

// == Translation Endpoint Tests ==

#[tokio::test]
async fn test_translation_put_get_and_prune() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            "/translations/gpt-4o-mini:John%203%3A16:0001f2a3",
            r#"{"response":"Denn also hat Gott die Welt geliebt"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/translations/gpt-4o-mini:John%203%3A16:0001f2a3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "gpt-4o-mini:John 3:16:0001f2a3");
    assert_eq!(json["response"], "Denn also hat Gott die Welt geliebt");

    let response = app
        .oneshot(send_json("POST", "/translations/prune", "{}"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["evicted"], 1);
    assert_eq!(json["remaining"], 0);
}

#[tokio::test]
async fn test_translation_touch() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json("POST", "/translations/gpt-4o:Ruth%201%3A16:00000001/touch", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(send_json(
            "PUT",
            "/translations/gpt-4o:Ruth%201%3A16:00000001",
            r#"{"response":"Whither thou goest"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(send_json("POST", "/translations/gpt-4o:Ruth%201%3A16:00000001/touch", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "gpt-4o:Ruth 1:16:00000001");
}

// == Quota Endpoint Tests ==

#[tokio::test]
async fn test_quota_reports_whole_store() {
    let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::new());
    backend.set_item("bookmarks", "[]").unwrap();
    let app = create_app_with(Config::default(), backend);

    let response = app.oneshot(get("/quota")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    // ("bookmarks".len() + "[]".len()) * 2
    assert_eq!(json["usage_bytes"], 22);
    assert_eq!(json["quota_bytes"], 10 * 1024 * 1024);
    assert!(json["ratio"].as_f64().unwrap() < 0.001);
}

// == History & Settings Tests ==

#[tokio::test]
async fn test_history_bound_follows_settings() {
    let app = create_test_app();

    for i in 0..15 {
        let body = format!(r#"{{"question":"q{}","answer":"a{}","context":"Acts 2"}}"#, i, i);
        let response = app
            .clone()
            .oneshot(send_json("POST", "/history", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/history")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["question"], "q5");

    let response = app
        .clone()
        .oneshot(send_json("PUT", "/settings", r#"{"maxHistoryLength":4}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["maxHistoryLength"], 4);
    assert_eq!(json["model"], "gpt-4o-mini");

    let response = app.clone().oneshot(get("/history")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["entries"].as_array().unwrap().len(), 4);
    assert_eq!(json["entries"][0]["question"], "q11");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert!(json["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reader_state_position() {
    let app = create_test_app();

    let response = app.clone().oneshot(get("/state")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["currentVerse"]["book"], "Genesis");

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            "/state/verse",
            r#"{"book":"Isaiah","chapter":40,"verse":31,"bibleVersion":"web"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/state")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["currentVerse"]["chapter"], 40);
    assert_eq!(json["bibleVersion"], "web");
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(send_json("PUT", "/chapters/Genesis-1-kjv", "{not json"))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_question_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(send_json("POST", "/history", r#"{"question":"","answer":"a"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_persist_failure_surfaces_as_insufficient_storage() {
    let backend: Arc<dyn BackingStore> = Arc::new(MemoryStore::with_limit(40));
    let app = create_app_with(Config::default(), backend);

    let response = app
        .oneshot(send_json("PUT", "/chapters/Genesis-1-kjv", chapter_body("In the beginning")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("after 5 attempts"));
}

// == Persistence Tests ==

#[test]
fn test_file_store_survives_restart() {
    let path = temp_data_file("restart");

    tokio_test::block_on(async {
        let backend = Arc::new(FileStore::open(&path, None).unwrap());
        let app = create_app_with(Config::default(), backend);
        let response = app
            .oneshot(send_json("PUT", "/chapters/Ruth-1-kjv", chapter_body("Naomi")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    });

    tokio_test::block_on(async {
        let backend = Arc::new(FileStore::open(&path, None).unwrap());
        assert!(backend.get_item(CHAPTER_CACHE_KEY).unwrap().is_some());

        let state = AppState::from_config(&Config::default(), backend);
        state.load().await.unwrap();

        let response = create_router(state)
            .oneshot(get("/chapters/Ruth-1-kjv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["verses"][0]["text"], "Naomi");
    });

    let _ = std::fs::remove_file(&path);
}

// == Live Server Tests ==

#[tokio::test]
async fn test_live_server_health() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_test_app();

    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let json: Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["status"], "healthy");

    server.abort();
}
