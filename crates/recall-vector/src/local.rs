//! In-process store combining an embedding service with the vector index.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::error::Result;
use recall_core::types::SearchHit;
use tracing::debug;

use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::index::VectorIndex;
use crate::store::TextStore;

/// Store that embeds text locally and keeps vectors in a [`VectorIndex`].
///
/// Uses dynamic dispatch (`Box<dyn DynEmbeddingService>`) so the embedding
/// provider can be chosen from configuration at startup.
pub struct LocalStore {
    index: Arc<VectorIndex>,
    embedder: Box<dyn DynEmbeddingService>,
    n_results: usize,
}

impl LocalStore {
    /// Create a store over a shared index with a statically known embedder.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: impl EmbeddingService + 'static,
        n_results: usize,
    ) -> Self {
        Self::new_dyn(index, Box::new(embedder), n_results)
    }

    /// Create a store from a pre-boxed embedding service.
    pub fn new_dyn(
        index: Arc<VectorIndex>,
        embedder: Box<dyn DynEmbeddingService>,
        n_results: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            n_results: n_results.max(1),
        }
    }

    /// Get a reference to the underlying vector index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[async_trait]
impl TextStore for LocalStore {
    async fn add_text(&self, text: &str) -> Result<()> {
        let embedding = self.embedder.embed_boxed(text).await?;
        let id = self.index.insert_next(embedding, text)?;
        debug!(id = %id, text_len = text.len(), "Indexed text");
        Ok(())
    }

    async fn search_text(&self, query: &str) -> Result<Vec<SearchHit>> {
        if self.index.is_empty()? {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, self.n_results)?;
        debug!(query_len = query.len(), hits = hits.len(), "Search complete");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        self.index.len()
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
