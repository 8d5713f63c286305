//! The store-client capability and its construction from configuration.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use recall_core::config::RecallConfig;
use recall_core::error::{RecallError, Result};
use recall_core::types::SearchHit;
use tracing::info;

use crate::chroma::ChromaStore;
use crate::embedding::{DynEmbeddingService, HashingEmbedding, OnnxEmbeddingService};
use crate::index::VectorIndex;
use crate::local::LocalStore;

/// A vector store that indexes free-form text and answers similarity queries.
///
/// Implementations must be safe to share across concurrent requests; the
/// gateway holds exactly one instance for the life of the process.
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Index `text`. Empty strings are accepted and stored as-is.
    async fn add_text(&self, text: &str) -> Result<()>;

    /// Return the entries most similar to `query`, best first.
    async fn search_text(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Number of documents currently held by the store.
    async fn count(&self) -> Result<usize>;

    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}

/// Build the embedding service selected by `config.embedding.provider`.
pub fn build_embedder(config: &RecallConfig) -> Result<Box<dyn DynEmbeddingService>> {
    match config.embedding.provider.as_str() {
        "hashing" => Ok(Box::new(HashingEmbedding::new(config.embedding.dimensions))),
        "onnx" => {
            let svc = OnnxEmbeddingService::from_directory(Path::new(&config.embedding.model_dir))?;
            Ok(Box::new(svc))
        }
        other => Err(RecallError::Config(format!(
            "Unknown embedding provider '{}'",
            other
        ))),
    }
}

/// Build the single process-wide store client described by `config`.
pub fn build_store(config: &RecallConfig) -> Result<Arc<dyn TextStore>> {
    let embedder = build_embedder(config)?;

    let store: Arc<dyn TextStore> = match config.store.backend.as_str() {
        "local" => Arc::new(LocalStore::new_dyn(
            Arc::new(VectorIndex::new()),
            embedder,
            config.store.n_results,
        )),
        "chroma" => Arc::new(ChromaStore::new(
            &config.chroma,
            &config.store.collection,
            embedder,
            config.store.n_results,
        )?),
        other => {
            return Err(RecallError::Config(format!(
                "Unknown store backend '{}'",
                other
            )))
        }
    };

    info!(
        backend = store.backend(),
        collection = %config.store.collection,
        n_results = config.store.n_results,
        embedding = %config.embedding.provider,
        "Store client ready"
    );
    Ok(store)
}
