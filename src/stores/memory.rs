//! In-process vector store with an exact cosine scan.
//!
//! Reference backend: no persistence, no index, but identical semantics to
//! the SQLite backend including owner filtering and deterministic ordering.
//! Suited to tests, demos, and corpora the size of a handful of résumés.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ScoredMatch, VectorRecord, VectorStore};
use crate::types::RagError;

#[derive(Default)]
pub struct MemoryVectorStore {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut stored = self.records.write();
        for record in records {
            match stored.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        owner: &str,
    ) -> Result<Vec<ScoredMatch>, RagError> {
        let stored = self.records.read();
        let mut hits: Vec<ScoredMatch> = stored
            .iter()
            .filter(|record| record.metadata.owner == owner)
            .filter_map(|record| {
                let score = cosine_similarity(&record.embedding, query_embedding)?;
                Some(ScoredMatch {
                    id: record.id.clone(),
                    score: score as f32,
                    metadata: record.metadata.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_by_source(&self, owner: &str, source: &str) -> Result<usize, RagError> {
        let mut stored = self.records.write();
        let before = stored.len();
        stored.retain(|record| {
            record.metadata.owner != owner || record.metadata.source != source
        });
        Ok(before - stored.len())
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.records.read().len())
    }
}

/// Cosine similarity with `f64` accumulation.
///
/// Returns `None` for mismatched lengths or zero-magnitude vectors, which
/// excludes the record from results rather than ranking it arbitrarily.
fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::RecordMetadata;

    fn record(id: &str, owner: &str, embedding: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord::new(
            embedding,
            RecordMetadata {
                text: text.to_owned(),
                owner: owner.to_owned(),
                source: format!("{owner}_cv.pdf"),
                chunk_index: 0,
            },
        )
        .with_id(id)
    }

    #[tokio::test]
    async fn search_filters_by_owner() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", "Jorge", vec![1.0, 0.0], "jorge chunk"),
                record("b", "Ricardo", vec![1.0, 0.0], "ricardo chunk"),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, "Jorge").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.owner, "Jorge");
    }

    #[tokio::test]
    async fn search_orders_most_similar_first() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![
                record("far", "Jorge", vec![0.0, 1.0], "orthogonal"),
                record("near", "Jorge", vec![1.0, 0.1], "close"),
                record("exact", "Jorge", vec![1.0, 0.0], "identical"),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2, "Jorge").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "exact");
        assert_eq!(hits[1].id, "near");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn equal_scores_break_ties_by_id() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![
                record("b", "Jorge", vec![1.0, 0.0], "second"),
                record("a", "Jorge", vec![1.0, 0.0], "first"),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2, "Jorge").await.unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "b");
    }

    #[tokio::test]
    async fn unknown_owner_yields_empty_not_error() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![record("a", "Jorge", vec![1.0, 0.0], "chunk")])
            .await
            .unwrap();
        let hits = store.search(&[1.0, 0.0], 5, "Marcela").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_matching_id() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![record("a", "Jorge", vec![1.0, 0.0], "old")])
            .await
            .unwrap();
        store
            .upsert(vec![record("a", "Jorge", vec![1.0, 0.0], "new")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.search(&[1.0, 0.0], 1, "Jorge").await.unwrap();
        assert_eq!(hits[0].metadata.text, "new");
    }

    #[tokio::test]
    async fn delete_by_source_removes_only_that_document() {
        let store = MemoryVectorStore::new();
        let mut other = record("c", "Jorge", vec![0.5, 0.5], "other doc");
        other.metadata.source = "Jorge_notes.pdf".to_owned();
        store
            .upsert(vec![
                record("a", "Jorge", vec![1.0, 0.0], "cv chunk"),
                record("b", "Ricardo", vec![1.0, 0.0], "ricardo chunk"),
                other,
            ])
            .await
            .unwrap();

        let removed = store.delete_by_source("Jorge", "Jorge_cv.pdf").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn zero_vector_records_are_excluded() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![record("z", "Jorge", vec![0.0, 0.0], "degenerate")])
            .await
            .unwrap();
        let hits = store.search(&[1.0, 0.0], 5, "Jorge").await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_none());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    }
}
