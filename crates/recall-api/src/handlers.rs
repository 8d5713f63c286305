//! Route handler functions.
//!
//! The add and search handlers forward their single string parameter to the
//! store client unchanged. Store errors are logged and propagated as 500s.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use recall_core::types::{SearchHit, RESULT_SCHEMA_VERSION};

use crate::error::ApiError;
use crate::params::{Params, RequiredParam};
use crate::state::AppState;

// =============================================================================
// Parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddTextParams {
    pub text: String,
}

impl RequiredParam for AddTextParams {
    const NAME: &'static str = "text";
}

#[derive(Debug, Deserialize)]
pub struct SearchTextParams {
    pub query: String,
}

impl RequiredParam for SearchTextParams {
    const NAME: &'static str = "query";
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub backend: String,
    /// `None` when the store cannot report its size.
    pub document_count: Option<u64>,
    pub result_schema: u32,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /store/add - index `text` in the store.
pub async fn add_text(
    State(state): State<AppState>,
    Params(params): Params<AddTextParams>,
) -> Result<StatusCode, ApiError> {
    debug!(text_len = params.text.len(), "AddText");

    state.store.add_text(&params.text).await.map_err(|e| {
        warn!(error = %e, "AddText failed");
        ApiError::from(e)
    })?;

    Ok(StatusCode::OK)
}

/// POST /store/search - similarity search for `query`.
pub async fn search_text(
    State(state): State<AppState>,
    Params(params): Params<SearchTextParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let hits = state.store.search_text(&params.query).await.map_err(|e| {
        warn!(error = %e, "SearchText failed");
        ApiError::from(e)
    })?;

    debug!(query_len = params.query.len(), hits = hits.len(), "SearchText");
    Ok(Json(hits))
}

/// GET /health - liveness plus store summary.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let document_count = match state.store.count().await {
        Ok(n) => Some(n as u64),
        Err(e) => {
            warn!(error = %e, "Store count unavailable");
            None
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        uptime_secs: state.start_time.elapsed().as_secs(),
        backend: state.store.backend().to_string(),
        document_count,
        result_schema: RESULT_SCHEMA_VERSION,
    })
}
