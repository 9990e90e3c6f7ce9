//! Crate-wide error type and result alias.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type RagResult<T> = Result<T, RagError>;

/// Errors surfaced by the ingestion and query pipelines.
///
/// Variants map to pipeline stages rather than underlying libraries so
/// callers can react to *where* a failure happened without depending on
/// backend-specific error types.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration caught at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Agent registry construction or lookup failure.
    #[error("agent registry error: {0}")]
    Registry(String),

    /// A source document could not be opened or parsed at all.
    ///
    /// Individual unreadable pages are skipped and counted instead of
    /// raising this.
    #[error("document extraction failed: {0}")]
    Extraction(String),

    /// The embedding provider rejected a request.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// An embedding's length does not match the configured dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector store failure (connection, schema, query).
    #[error("vector store error: {0}")]
    Store(String),

    /// The completion provider rejected a request.
    #[error("completion provider error: {0}")]
    Completion(String),

    /// An external call exceeded its deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// Filesystem error while reading source documents.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
