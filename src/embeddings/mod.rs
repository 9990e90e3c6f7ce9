//! Embedding provider seam.
//!
//! [`Embedder`] is the crate's own trait so the pipelines never depend on a
//! concrete provider. [`RigEmbedder`] bridges any
//! [`rig::embeddings::embedding::EmbeddingModel`]; [`HashEmbedder`] is a
//! deterministic offline implementation for tests and demos.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rig::embeddings::embedding::EmbeddingModel;

use crate::types::{RagError, RagResult};

/// Text-to-vector provider.
///
/// Implementations must be deterministic for identical input within one
/// process, and every returned vector must have [`dimension`] entries.
///
/// [`dimension`]: Embedder::dimension
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Embed many texts, preserving input order.
    ///
    /// The default embeds one at a time; providers with a batch endpoint
    /// should override this.
    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Adapter over any rig embedding model.
///
/// Batches are split to the model's `MAX_DOCUMENTS` and the provider's
/// `f64` components are narrowed to `f32`, which is what the stores keep.
#[derive(Clone)]
pub struct RigEmbedder<M> {
    model: M,
}

impl<M> RigEmbedder<M>
where
    M: EmbeddingModel,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M> Embedder for RigEmbedder<M>
where
    M: EmbeddingModel,
{
    fn dimension(&self) -> usize {
        self.model.ndims()
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let embeddings = self
            .model
            .embed_texts(vec![text.to_owned()])
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        embeddings
            .into_iter()
            .next()
            .map(|embedding| narrow(embedding.vec))
            .ok_or_else(|| RagError::Embedding("provider returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        let batch_size = M::MAX_DOCUMENTS.max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for window in texts.chunks(batch_size) {
            let embeddings = self
                .model
                .embed_texts(window.to_vec())
                .await
                .map_err(|err| RagError::Embedding(err.to_string()))?;
            if embeddings.len() != window.len() {
                return Err(RagError::Embedding(format!(
                    "provider returned {} embeddings for {} texts",
                    embeddings.len(),
                    window.len()
                )));
            }
            vectors.extend(embeddings.into_iter().map(|e| narrow(e.vec)));
        }
        Ok(vectors)
    }
}

fn narrow(vec: Vec<f64>) -> Vec<f32> {
    vec.into_iter().map(|component| component as f32).collect()
}

/// Deterministic hash-projection embedder.
///
/// Not semantically meaningful; it exists so the full pipeline can run
/// offline with stable, repeatable vectors of any dimension.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimension)
            .map(|i| {
                let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 24);
                (bits as f32) / u32::MAX as f32
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        Ok(self.project(text))
    }
}
