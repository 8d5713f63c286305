//! In-memory vector index with brute-force cosine similarity search.
//!
//! Every search scans all entries, which keeps results exact and is fast
//! enough for collections in the tens of thousands.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use recall_core::error::RecallError;
use recall_core::types::{next_document_id, SearchHit};

/// An entry stored in the vector index.
#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    text: String,
    /// Insertion order, used to break score ties.
    seq: u64,
}

#[derive(Debug, Default)]
struct IndexInner {
    entries: HashMap<String, VectorEntry>,
    next_seq: u64,
}

impl IndexInner {
    fn upsert(&mut self, id: String, embedding: Vec<f32>, text: String) {
        let seq = match self.entries.get(&id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.entries.insert(id, VectorEntry { embedding, text, seq });
    }
}

/// Thread-safe in-memory vector index.
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    inner: Arc<RwLock<IndexInner>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> RecallError {
    RecallError::Store(format!("Lock poisoned: {}", e))
}

impl VectorIndex {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry stored under `id`.
    ///
    /// A replaced entry keeps its original insertion position.
    pub fn upsert(
        &self,
        id: impl Into<String>,
        embedding: Vec<f32>,
        text: impl Into<String>,
    ) -> Result<(), RecallError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.upsert(id.into(), embedding, text.into());
        Ok(())
    }

    /// Store `text` under the next sequential document id and return that id.
    ///
    /// Id assignment and insertion happen under one write lock, so concurrent
    /// callers always receive distinct ids.
    pub fn insert_next(
        &self,
        embedding: Vec<f32>,
        text: impl Into<String>,
    ) -> Result<String, RecallError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let id = next_document_id(inner.entries.len());
        inner.upsert(id.clone(), embedding, text.into());
        Ok(id)
    }

    /// Return the `k` entries most similar to `query`.
    ///
    /// Results are sorted by descending cosine similarity; equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, RecallError> {
        let inner = self.inner.read().map_err(poisoned)?;

        let mut scored: Vec<(u64, SearchHit)> = inner
            .entries
            .iter()
            .map(|(id, entry)| {
                let score = cosine_similarity(query, &entry.embedding);
                (entry.seq, SearchHit::new(id.clone(), score, entry.text.clone()))
            })
            .collect();

        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Return the text stored under `id`, if any.
    pub fn get(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.entries.get(id).map(|e| e.text.clone()))
    }

    /// Return the number of vectors currently stored in the index.
    pub fn len(&self) -> Result<usize, RecallError> {
        Ok(self.inner.read().map_err(poisoned)?.entries.len())
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> Result<bool, RecallError> {
        Ok(self.len()? == 0)
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let inner = Arc::clone(&self.inner);
        let _ = std::thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("writer panicked while holding the index lock");
        })
        .join();
    }
}

/// Compute cosine similarity between two vectors.
///
/// Two zero-magnitude vectors are identical and score 1.0, so token-free
/// text (including the empty string) finds itself. Returns 0.0 if only one
/// vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 && mag_b == 0.0 {
        return 1.0;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
