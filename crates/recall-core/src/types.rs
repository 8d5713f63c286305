//! Boundary types shared between the store crates and the HTTP layer.

use serde::{Deserialize, Serialize};

/// Version of the [`SearchHit`] wire schema, reported by `/health`.
pub const RESULT_SCHEMA_VERSION: u32 = 1;

/// A single similarity-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Store-assigned document id (e.g. `doc_3`).
    pub id: String,
    /// Cosine similarity to the query; higher is closer.
    pub score: f64,
    /// The indexed text.
    pub text: String,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            text: text.into(),
        }
    }
}

/// Id assigned to the next document in a collection holding `count` documents.
///
/// Ids are 1-based and follow the collection size.
pub fn next_document_id(count: usize) -> String {
    format!("doc_{}", count + 1)
}
