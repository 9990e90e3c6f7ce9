//! Agent-routed retrieval-augmented generation over per-person document
//! partitions.
//!
//! ```text
//! PDF ──► ingestion::extract ──► chunking ──► embeddings ──┐
//!                                                          ▼
//!                                         stores (owner-tagged records)
//!                                                          ▲
//! question ──► registry (agent resolution) ──► retrieval ──┘
//!                                                  │
//!                                                  ▼
//!                        prompt (segregated templates) ──► completion
//!                                                  │
//!                                                  ▼
//!                               query::RagAnswer (answer + provenance)
//! ```
//!
//! Every external collaborator sits behind a trait seam — [`Embedder`],
//! [`VectorStore`], [`Completion`] — and is injected at construction, so
//! the whole pipeline runs offline against the in-process fakes.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dossier::{
//!     AgentRegistry, HashEmbedder, Ingestor, MemoryVectorStore, RagConfig,
//!     RagService,
//! };
//! # use dossier::{Completion, RagResult};
//! # use async_trait::async_trait;
//! # struct Canned;
//! # #[async_trait]
//! # impl Completion for Canned {
//! #     async fn complete(&self, _prompt: &str) -> RagResult<String> {
//! #         Ok("answer".into())
//! #     }
//! # }
//!
//! # async fn run() -> dossier::RagResult<()> {
//! let embedder = Arc::new(HashEmbedder::new(384));
//! let store = Arc::new(MemoryVectorStore::new());
//!
//! let ingestor = Ingestor::builder()
//!     .embedder(embedder.clone())
//!     .store(store.clone())
//!     .build()?;
//! ingestor.upload_document("cvs/Jorge_cv.pdf", None).await?;
//!
//! let service = RagService::builder()
//!     .registry(AgentRegistry::new(["Jorge", "Ricardo", "Francisco"])?)
//!     .embedder(embedder)
//!     .store(store)
//!     .completion(Arc::new(Canned))
//!     .config(RagConfig::default())
//!     .build()?;
//!
//! let reply = service.answer("What is Jorge's latest job?").await?;
//! assert_eq!(reply.agents_used, ["Jorge"]);
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod completion;
pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod prompt;
pub mod query;
pub mod registry;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use chunking::{ChunkingConfig, RecursiveChunker};
pub use completion::{Completion, RigCompletion};
pub use config::RagConfig;
pub use embeddings::{Embedder, HashEmbedder, RigEmbedder};
pub use ingestion::{IngestionReport, Ingestor, derive_owner, extract_pdf};
pub use prompt::PromptComposer;
pub use query::{RagAnswer, RagService};
pub use registry::{Agent, AgentRegistry};
pub use retrieval::{AgentContext, ContextSet, Retriever};
pub use stores::{
    MemoryVectorStore, RecordMetadata, ScoredMatch, SqliteVectorStore, VectorRecord, VectorStore,
};
pub use types::{RagError, RagResult};
