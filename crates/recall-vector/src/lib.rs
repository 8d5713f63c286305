//! Recall vector crate - store clients, embedding services, and the in-memory index.
//!
//! [`TextStore`] is the capability the HTTP gateway forwards to. Two engines
//! implement it: [`LocalStore`] embeds and indexes in-process, and
//! [`ChromaStore`] talks to a ChromaDB server over its REST API.

pub mod chroma;
pub mod embedding;
pub mod index;
pub mod local;
pub mod store;

pub use chroma::ChromaStore;
pub use embedding::{DynEmbeddingService, EmbeddingService, HashingEmbedding, OnnxEmbeddingService};
pub use index::VectorIndex;
pub use local::LocalStore;
pub use store::{build_embedder, build_store, TextStore};
