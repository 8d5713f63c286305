//! Application state shared across all route handlers.
//!
//! AppState holds the process-wide store client. It is passed to handlers
//! via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use recall_vector::TextStore;

/// Shared application state.
///
/// Cloning is cheap; every clone refers to the same store client.
#[derive(Clone)]
pub struct AppState {
    /// The single store client used by every request.
    pub store: Arc<dyn TextStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    /// Wall-clock start time reported by `/health`.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState around the given store client.
    pub fn new(store: Arc<dyn TextStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}
