//! Client for a remote ChromaDB server speaking its REST API (v2, served by
//! Chroma 0.6 and every 1.x release).
//!
//! Collections are addressed under
//! `/api/v2/tenants/{tenant}/databases/{database}/`.
//!
//! Embeddings are computed locally by the configured embedding service and
//! sent alongside the documents, so the server needs no embedding function
//! of its own. The collection is created with cosine distance, which makes
//! `1 - distance` a cosine similarity comparable to the local store's scores.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

use recall_core::config::ChromaConfig;
use recall_core::error::{RecallError, Result};
use recall_core::types::{next_document_id, SearchHit};

use crate::embedding::DynEmbeddingService;
use crate::store::TextStore;

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: [&'static str; 2],
}

/// Chroma returns one inner list per query embedding.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl QueryResponse {
    fn into_hits(self) -> Vec<SearchHit> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let documents = self
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let distances = self
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        ids.into_iter()
            .enumerate()
            .map(|(i, id)| {
                let text = documents.get(i).cloned().flatten().unwrap_or_default();
                let score = distances
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|d| 1.0 - d)
                    .unwrap_or(0.0);
                SearchHit { id, score, text }
            })
            .collect()
    }
}

/// Store client backed by a ChromaDB collection.
pub struct ChromaStore {
    client: Client,
    /// `{url}/api/v2/tenants/{tenant}/databases/{database}`
    database_url: String,
    collection: String,
    collection_id: OnceCell<Uuid>,
    embedder: Box<dyn DynEmbeddingService>,
    n_results: usize,
    /// Serializes count-then-upsert so concurrent adds get distinct ids.
    add_lock: Mutex<()>,
}

impl ChromaStore {
    /// Create a client for `collection` in the tenant and database named by
    /// `config`.
    ///
    /// No request is made until the first operation; the collection is
    /// created on demand and its id cached.
    pub fn new(
        config: &ChromaConfig,
        collection: &str,
        embedder: Box<dyn DynEmbeddingService>,
        n_results: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecallError::Store(format!("HTTP client: {}", e)))?;

        let database_url = format!(
            "{}/api/v2/tenants/{}/databases/{}",
            config.url.trim_end_matches('/'),
            config.tenant,
            config.database
        );
        info!(
            url = %config.url,
            tenant = %config.tenant,
            database = %config.database,
            collection,
            "Chroma client configured"
        );

        Ok(Self {
            client,
            database_url,
            collection: collection.to_string(),
            collection_id: OnceCell::new(),
            embedder,
            n_results: n_results.max(1),
            add_lock: Mutex::new(()),
        })
    }

    async fn collection_id(&self) -> Result<Uuid> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let body = CreateCollectionRequest {
                    name: &self.collection,
                    get_or_create: true,
                    metadata: serde_json::json!({ "hnsw:space": "cosine" }),
                };
                let resp: CollectionResponse = self
                    .send_json(self.client.post(self.url("collections")).json(&body))
                    .await?;
                info!(collection = %self.collection, id = %resp.id, "Chroma collection resolved");
                Ok::<_, RecallError>(resp.id)
            })
            .await?;
        Ok(*id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.database_url, path)
    }

    async fn collection_url(&self, op: &str) -> Result<String> {
        let id = self.collection_id().await?;
        Ok(self.url(&format!("collections/{}/{}", id, op)))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| RecallError::Store(format!("Chroma request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RecallError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RecallError::Serialization(format!("Chroma response: {}", e)))
    }
}

#[async_trait]
impl TextStore for ChromaStore {
    async fn add_text(&self, text: &str) -> Result<()> {
        let embedding = self.embedder.embed_boxed(text).await?;
        let url = self.collection_url("upsert").await?;

        let _guard = self.add_lock.lock().await;
        let id = next_document_id(self.count().await?);
        let body = UpsertRequest {
            ids: vec![id.clone()],
            embeddings: vec![embedding],
            documents: vec![text],
        };
        self.send(self.client.post(url).json(&body)).await?;
        debug!(id = %id, text_len = text.len(), "Upserted text into Chroma");
        Ok(())
    }

    async fn search_text(&self, query: &str) -> Result<Vec<SearchHit>> {
        let count = self.count().await?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_boxed(query).await?;
        let body = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: self.n_results.min(count),
            include: ["documents", "distances"],
        };
        let url = self.collection_url("query").await?;
        let resp: QueryResponse = self.send_json(self.client.post(url).json(&body)).await?;

        let hits = resp.into_hits();
        debug!(query_len = query.len(), hits = hits.len(), "Chroma query complete");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let url = self.collection_url("count").await?;
        self.send_json(self.client.get(url)).await
    }

    fn backend(&self) -> &'static str {
        "chroma"
    }
}
