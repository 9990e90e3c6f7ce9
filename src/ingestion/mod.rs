//! Document ingestion: extraction, chunking, embedding, and upsert.
//!
//! [`Ingestor`] turns one source document plus an owning agent into a batch
//! of [`VectorRecord`]s in the store. The flow is extract → chunk →
//! batch-embed → build records → one upsert per document.
//!
//! Re-ingesting the same document is not idempotent by default: every run
//! mints fresh record ids, so duplicates accumulate. The opt-in
//! `replace_existing` policy deletes the document's previous records
//! (matched by owner and source name) before upserting.

pub mod extract;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::chunking::RecursiveChunker;
use crate::embeddings::Embedder;
use crate::stores::{RecordMetadata, VectorRecord, VectorStore};
use crate::types::{RagError, RagResult};

pub use extract::{ExtractedDocument, PAGE_SEPARATOR, extract_pdf};

/// Summary of one ingestion run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestionReport {
    pub owner: String,
    pub source: String,
    /// Pages that contributed text. Zero for non-PDF text ingestion.
    pub pages: usize,
    /// Pages skipped because extraction failed or produced nothing.
    pub skipped_pages: usize,
    pub chunks: usize,
    pub records_upserted: usize,
    /// Records deleted first under the replace-existing policy.
    pub records_replaced: usize,
}

/// Derive an owner name from a source file name.
///
/// Convention inherited from the corpus layout: the text before the first
/// `_` (or, lacking one, the whole stem), capitalized — `Jorge_cv.pdf`
/// becomes `Jorge`. An explicit owner always overrides this.
pub fn derive_owner(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let prefix = stem.split('_').next().unwrap_or(stem);
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Builds [`Ingestor`]s with injected collaborators.
#[derive(Default)]
pub struct IngestorBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
    chunker: Option<RecursiveChunker>,
    replace_existing: bool,
}

impl IngestorBuilder {
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn chunker(mut self, chunker: RecursiveChunker) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Delete a document's previous records before upserting new ones.
    #[must_use]
    pub fn replace_existing(mut self, enabled: bool) -> Self {
        self.replace_existing = enabled;
        self
    }

    pub fn build(self) -> RagResult<Ingestor> {
        Ok(Ingestor {
            embedder: self
                .embedder
                .ok_or_else(|| RagError::Config("ingestor requires an embedder".into()))?,
            store: self
                .store
                .ok_or_else(|| RagError::Config("ingestor requires a vector store".into()))?,
            chunker: self.chunker.unwrap_or_else(RecursiveChunker::with_defaults),
            replace_existing: self.replace_existing,
        })
    }
}

/// The ingestion pipeline.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: RecursiveChunker,
    replace_existing: bool,
}

impl Ingestor {
    pub fn builder() -> IngestorBuilder {
        IngestorBuilder::default()
    }

    /// Ingest the PDF at `path` for `owner`, deriving the owner from the
    /// file name when none is given.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn upload_document(
        &self,
        path: impl AsRef<Path>,
        owner: Option<&str>,
    ) -> RagResult<IngestionReport> {
        let path = path.as_ref();
        let source = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RagError::Extraction(format!("unusable file name: {}", path.display()))
            })?
            .to_owned();
        let owner = match owner {
            Some(owner) => owner.to_owned(),
            None => derive_owner(&source),
        };

        let extracted = extract::extract_pdf(path)?;
        debug!(
            pages = extracted.pages,
            skipped = extracted.skipped_pages,
            "extracted document text"
        );

        let mut report = self.ingest_text(&extracted.text, &owner, &source).await?;
        report.pages = extracted.pages;
        report.skipped_pages = extracted.skipped_pages;
        Ok(report)
    }

    /// Ingest already-extracted text. The entry point `upload_document`
    /// delegates to; also the seam tests and non-PDF callers use.
    pub async fn ingest_text(
        &self,
        text: &str,
        owner: &str,
        source: &str,
    ) -> RagResult<IngestionReport> {
        let records_replaced = if self.replace_existing {
            self.store.delete_by_source(owner, source).await?
        } else {
            0
        };

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            info!(owner, source, "document produced no chunks");
            return Ok(IngestionReport {
                owner: owner.to_owned(),
                source: source.to_owned(),
                pages: 0,
                skipped_pages: 0,
                chunks: 0,
                records_upserted: 0,
                records_replaced,
            });
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        let expected = self.embedder.dimension();
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(chunk_index, (text, embedding))| {
                VectorRecord::new(
                    embedding,
                    RecordMetadata {
                        text,
                        owner: owner.to_owned(),
                        source: source.to_owned(),
                        chunk_index,
                    },
                )
            })
            .collect();
        let records_upserted = records.len();

        self.store.upsert(records).await?;
        info!(owner, source, records_upserted, records_replaced, "ingested document");

        Ok(IngestionReport {
            owner: owner.to_owned(),
            source: source.to_owned(),
            pages: 0,
            skipped_pages: 0,
            chunks: records_upserted,
            records_upserted,
            records_replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::embeddings::HashEmbedder;
    use crate::stores::MemoryVectorStore;

    fn ingestor(store: Arc<MemoryVectorStore>, replace: bool) -> Ingestor {
        Ingestor::builder()
            .embedder(Arc::new(HashEmbedder::new(8)))
            .store(store)
            .chunker(
                RecursiveChunker::new(
                    ChunkingConfig::default()
                        .with_chunk_size(80)
                        .with_chunk_overlap(10),
                )
                .unwrap(),
            )
            .replace_existing(replace)
            .build()
            .unwrap()
    }

    #[test]
    fn owner_derivation_takes_prefix_before_underscore() {
        assert_eq!(derive_owner("Jorge_cv.pdf"), "Jorge");
        assert_eq!(derive_owner("ricardo_resume_2024.pdf"), "Ricardo");
        assert_eq!(derive_owner("FRANCISCO_cv.pdf"), "Francisco");
        assert_eq!(derive_owner("marcela.pdf"), "Marcela");
    }

    #[tokio::test]
    async fn ingest_text_stores_one_record_per_chunk() {
        let store = Arc::new(MemoryVectorStore::new());
        let text = (0..20)
            .map(|i| format!("Line {i} of the résumé"))
            .collect::<Vec<_>>()
            .join("\n");

        let report = ingestor(store.clone(), false)
            .ingest_text(&text, "Jorge", "Jorge_cv.pdf")
            .await
            .unwrap();

        assert!(report.chunks > 1);
        assert_eq!(report.records_upserted, report.chunks);
        assert_eq!(report.records_replaced, 0);
        assert_eq!(store.count().await.unwrap(), report.records_upserted);
    }

    #[tokio::test]
    async fn empty_text_yields_empty_report_not_error() {
        let store = Arc::new(MemoryVectorStore::new());
        let report = ingestor(store.clone(), false)
            .ingest_text("", "Jorge", "Jorge_cv.pdf")
            .await
            .unwrap();
        assert_eq!(report.chunks, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reingest_duplicates_by_default() {
        let store = Arc::new(MemoryVectorStore::new());
        let ingestor = ingestor(store.clone(), false);
        ingestor.ingest_text("short text", "Jorge", "Jorge_cv.pdf").await.unwrap();
        ingestor.ingest_text("short text", "Jorge", "Jorge_cv.pdf").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_existing_deletes_previous_records_first() {
        let store = Arc::new(MemoryVectorStore::new());
        let ingestor = ingestor(store.clone(), true);
        ingestor.ingest_text("short text", "Jorge", "Jorge_cv.pdf").await.unwrap();
        let report = ingestor
            .ingest_text("revised text", "Jorge", "Jorge_cv.pdf")
            .await
            .unwrap();

        assert_eq!(report.records_replaced, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn chunk_indices_are_sequential() {
        let store = Arc::new(MemoryVectorStore::new());
        let text = (0..30)
            .map(|i| format!("Sentence {i} with filler"))
            .collect::<Vec<_>>()
            .join(". ");
        ingestor(store.clone(), false)
            .ingest_text(&text, "Ricardo", "Ricardo_cv.pdf")
            .await
            .unwrap();

        let embedder = HashEmbedder::new(8);
        let query = embedder.embed("anything").await.unwrap();
        let hits = store.search(&query, 100, "Ricardo").await.unwrap();
        let mut indices: Vec<usize> = hits.iter().map(|h| h.metadata.chunk_index).collect();
        indices.sort_unstable();
        let expected: Vec<usize> = (0..indices.len()).collect();
        assert_eq!(indices, expected);
    }
}
