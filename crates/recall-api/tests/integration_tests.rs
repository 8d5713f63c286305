//! Integration tests for the Recall API.
//!
//! Each test builds its own router over a fresh in-memory store, or over a
//! store that records calls or fails on demand.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use recall_api::create_router;
use recall_api::handlers::HealthResponse;
use recall_api::state::AppState;
use recall_core::config::ServerConfig;
use recall_core::error::{RecallError, Result};
use recall_core::types::SearchHit;
use recall_vector::{HashingEmbedding, LocalStore, TextStore, VectorIndex};

// =============================================================================
// Helpers
// =============================================================================

/// Create a fresh AppState over an empty local store.
fn make_state() -> AppState {
    let store = LocalStore::new(Arc::new(VectorIndex::new()), HashingEmbedding::default(), 2);
    AppState::new(Arc::new(store))
}

fn make_app(state: AppState) -> axum::Router {
    create_router(state, &ServerConfig::default())
}

/// POST with parameters only in the query string.
fn post_query(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn search(app: &axum::Router, query: &str) -> Vec<SearchHit> {
    let resp = app
        .clone()
        .oneshot(post_json("/store/search", &serde_json::json!({ "query": query }).to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Store that records every forwarded string and can be told to fail.
#[derive(Default)]
struct RecordingStore {
    added: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl TextStore for RecordingStore {
    async fn add_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(RecallError::Store("engine unavailable".to_string()));
        }
        self.added.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn search_text(&self, query: &str) -> Result<Vec<SearchHit>> {
        if self.fail {
            return Err(RecallError::Store("engine unavailable".to_string()));
        }
        self.queries.lock().unwrap().push(query.to_string());
        Ok(vec![SearchHit::new("doc_9", 0.5, "opaque")])
    }

    async fn count(&self) -> Result<usize> {
        if self.fail {
            return Err(RecallError::Store("engine unavailable".to_string()));
        }
        Ok(self.added.lock().unwrap().len())
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}

// =============================================================================
// AddText
// =============================================================================

#[tokio::test]
async fn test_add_text_query_param_returns_empty_ok() {
    let app = make_app(make_state());
    let resp = app
        .oneshot(post_query("/store/add?text=hello%20world"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn test_add_text_forwards_raw_string() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let resp = app
        .oneshot(post_json("/store/add", r#"{"text": "  Mixed CASE, punctuation!  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        *store.added.lock().unwrap(),
        vec!["  Mixed CASE, punctuation!  ".to_string()]
    );
}

#[tokio::test]
async fn test_add_text_empty_string_is_forwarded() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let resp = app.oneshot(post_query("/store/add?text=")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(*store.added.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn test_add_text_form_body() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let resp = app
        .oneshot(post_form("/store/add", "text=from+a+form"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(*store.added.lock().unwrap(), vec!["from a form".to_string()]);
}

#[tokio::test]
async fn test_add_text_structured_json_content_type() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let req = Request::post("/store/add")
        .header("content-type", "application/vnd.api+json; charset=utf-8")
        .body(Body::from(r#"{"text": "x"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(*store.added.lock().unwrap(), vec!["x".to_string()]);
}

#[tokio::test]
async fn test_query_string_wins_over_body() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let resp = app
        .oneshot(post_json("/store/add?text=from-query", r#"{"text": "from-body"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(*store.added.lock().unwrap(), vec!["from-query".to_string()]);
}

#[tokio::test]
async fn test_add_text_missing_param_returns_400() {
    let app = make_app(make_state());
    let resp = app.oneshot(post_query("/store/add")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("'text'"));
}

#[tokio::test]
async fn test_add_text_json_without_field_returns_400() {
    let app = make_app(make_state());
    let resp = app
        .oneshot(post_json("/store/add", r#"{"query": "wrong field"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_text_store_failure_returns_500() {
    let store = Arc::new(RecordingStore {
        fail: true,
        ..Default::default()
    });
    let app = make_app(AppState::new(store));

    let resp = app.oneshot(post_query("/store/add?text=boom")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["error"], "internal_error");
}

#[tokio::test]
async fn test_add_text_rejects_get() {
    let app = make_app(make_state());
    let resp = app
        .oneshot(Request::get("/store/add?text=x").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// SearchText
// =============================================================================

#[tokio::test]
async fn test_search_empty_store_returns_empty_array() {
    let app = make_app(make_state());
    let resp = app
        .oneshot(post_query("/store/search?query=anything"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_search_returns_store_results_unmodified() {
    let store = Arc::new(RecordingStore::default());
    let app = make_app(AppState::new(store.clone()));

    let hits = search(&app, "").await;
    assert_eq!(hits, vec![SearchHit::new("doc_9", 0.5, "opaque")]);
    assert_eq!(*store.queries.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn test_search_missing_param_returns_400() {
    let app = make_app(make_state());
    let resp = app
        .oneshot(post_json("/store/search", r#"{"text": "wrong field"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_store_failure_returns_500() {
    let store = Arc::new(RecordingStore {
        fail: true,
        ..Default::default()
    });
    let app = make_app(AppState::new(store));

    let resp = app
        .oneshot(post_query("/store/search?query=boom"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// End-to-end scenarios over the local store
// =============================================================================

#[tokio::test]
async fn test_hello_world_scenario() {
    let app = make_app(make_state());

    let resp = app
        .clone()
        .oneshot(post_query("/store/add?text=hello%20world"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(post_query("/store/add?text=deep%20learning%20models"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let hits = search(&app, "hello").await;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].text, "hello world");
    assert_eq!(hits[0].id, "doc_1");
}

#[tokio::test]
async fn test_round_trip_visibility() {
    let app = make_app(make_state());
    let text = "Vector embeddings represent text as numerical arrays";

    let resp = app
        .clone()
        .oneshot(post_json(
            "/store/add",
            &serde_json::json!({ "text": text }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let hits = search(&app, text).await;
    assert_eq!(hits[0].text, text);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_round_trip_visibility_for_token_free_text() {
    let app = make_app(make_state());
    for form in ["text=alpha", "text=beta", "text="] {
        let resp = app.clone().oneshot(post_form("/store/add", form)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(post_form("/store/search", "query="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let hits: Vec<SearchHit> = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(hits[0].id, "doc_3");
    assert_eq!(hits[0].text, "");

    let hits = search(&app, "?!").await;
    assert_eq!(hits[0].text, "");
}

#[tokio::test]
async fn test_concurrent_adds_are_not_dropped() {
    let state = make_state();
    let app = make_app(state.clone());

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(post_query(&format!("/store/add?text=entry{}", i)))
                .await
                .unwrap()
                .status()
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(state.store.count().await.unwrap(), 16);
}

#[tokio::test]
async fn test_legacy_chromadb_routes() {
    let app = make_app(make_state());

    let resp = app
        .clone()
        .oneshot(post_query("/chromadb/add?text=legacy%20client"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_query("/chromadb/search?query=legacy"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let hits: Vec<SearchHit> = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(hits[0].text, "legacy client");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_store() {
    let state = make_state();
    state.store.add_text("one").await.unwrap();
    let app = make_app(state);

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.backend, "local");
    assert_eq!(health.document_count, Some(1));
    assert_eq!(health.result_schema, 1);
}

#[tokio::test]
async fn test_health_survives_store_failure() {
    let store = Arc::new(RecordingStore {
        fail: true,
        ..Default::default()
    });
    let app = make_app(AppState::new(store));

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.backend, "recording");
    assert_eq!(health.document_count, None);
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_body_limit_enforced() {
    let server = ServerConfig {
        max_body_bytes: 64,
        ..ServerConfig::default()
    };
    let app = create_router(make_state(), &server);

    let big = serde_json::json!({ "text": "x".repeat(1024) }).to_string();
    let resp = app.oneshot(post_json("/store/add", &big)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = make_app(make_state());
    let resp = app.oneshot(post_query("/store/delete")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
