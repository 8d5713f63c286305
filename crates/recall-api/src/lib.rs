//! Recall API crate - axum HTTP gateway over a single store client.
//!
//! Exposes `/store/add` and `/store/search` (plus the `/chromadb/*` aliases)
//! as thin pass-throughs to [`recall_vector::TextStore`], and `/health`.

pub mod error;
pub mod handlers;
pub mod params;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
