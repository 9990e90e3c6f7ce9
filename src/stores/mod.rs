//! Vector storage backends for owner-partitioned chunk records.
//!
//! This module provides a unified [`VectorStore`] trait so the ingestion
//! and query pipelines can work with any supported backend without being
//! tied to a specific database.
//!
//! # Architecture
//!
//! ```text
//!                   ┌───────────────────┐
//!                   │ VectorStore trait │
//!                   │  (async, owner-   │
//!                   │  filtered search) │
//!                   └─────────┬─────────┘
//!                             │
//!                ┌────────────┴────────────┐
//!                ▼                         ▼
//!        ┌───────────────┐        ┌────────────────┐
//!        │    Memory     │        │     SQLite     │
//!        │  exact scan   │        │   sqlite-vec   │
//!        └───────────────┘        └────────────────┘
//! ```
//!
//! Every backend adapts its native result shape to [`ScoredMatch`] at its
//! own boundary; callers never see backend-specific types. Search results
//! are ordered most-similar-first by cosine similarity and always filtered
//! to a single owner, which is what keeps one person's records from leaking
//! into another's context.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RagError;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

/// Metadata stored with every vector record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// The chunk text itself.
    pub text: String,
    /// Name of the agent this record belongs to.
    pub owner: String,
    /// Source document name (file name, not full path).
    pub source: String,
    /// Zero-based position of the chunk within its document.
    pub chunk_index: usize,
}

/// A chunk embedding with its metadata, ready for storage.
///
/// Records are immutable once written; re-ingesting a document creates new
/// records with fresh identifiers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier, a v4 UUID unless overridden.
    pub id: String,
    /// The embedding vector.
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl VectorRecord {
    pub fn new(embedding: Vec<f32>, metadata: RecordMetadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            embedding,
            metadata,
        }
    }

    /// Replace the generated identifier, for tests that need stable ids.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// One search hit, normalized across backends.
#[derive(Clone, Debug)]
pub struct ScoredMatch {
    pub id: String,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Unified trait for vector storage backends.
///
/// # Implementors
///
/// - [`MemoryVectorStore`] — exact in-process scan, used by tests and demos
/// - [`SqliteVectorStore`] — persistent storage with `sqlite-vec` search
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert records, replacing any that share an id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError>;

    /// Return up to `top_k` records owned by `owner`, most similar first.
    ///
    /// An owner with no records yields an empty list, not an error.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        owner: &str,
    ) -> Result<Vec<ScoredMatch>, RagError>;

    /// Delete every record for one document of one owner, returning the
    /// number removed. Supports the replace-on-reingest policy.
    async fn delete_by_source(&self, owner: &str, source: &str) -> Result<usize, RagError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, RagError>;
}
