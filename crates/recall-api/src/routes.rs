//! Router setup and server startup.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use recall_core::config::{RecallConfig, ServerConfig};
use recall_core::error::RecallError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// `/chromadb/add` and `/chromadb/search` are kept as aliases of the
/// `/store/*` routes for existing clients.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/store/add", post(handlers::add_text))
        .route("/store/search", post(handlers::search_text))
        .route("/chromadb/add", post(handlers::add_text))
        .route("/chromadb/search", post(handlers::search_text))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&server.cors_origins) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

/// Build a CORS layer for the configured origins.
///
/// Returns `None` when no valid origin is configured. Unparseable origins
/// are skipped with a warning.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
    )
}

/// Start the HTTP server on the configured address.
///
/// Runs until the process receives Ctrl-C, then drains in-flight requests.
pub async fn start_server(config: &RecallConfig, state: AppState) -> Result<(), RecallError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RecallError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| RecallError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
