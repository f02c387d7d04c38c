//! Vector index abstraction.
//!
//! The nearest-neighbour engine is an external collaborator. The
//! [`VectorStore`] trait is the narrow contract it must satisfy: upsert
//! type-tagged vectors, search them filtered by document type, re-tag or
//! drop a document's vectors. Embedding, batching, timeouts and graceful
//! degradation are layered on top by the app crate's index client.

pub mod memory;

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, DocumentType, QueryHit};

/// One chunk's vector plus the metadata stored alongside it.
///
/// The record keeps its own copy of the chunk text: the index is a
/// projection of the chunk store, not a reference into it.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub chunk_id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub document_type: DocumentType,
    pub vector: Vec<f32>,
}

impl VectorRecord {
    pub fn from_chunk(chunk: &Chunk, document_type: DocumentType, vector: Vec<f32>) -> Self {
        Self {
            chunk_id: chunk.id.clone(),
            document_id: chunk.document_id.clone(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            document_type,
            vector,
        }
    }
}

/// Abstract vector index backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorStore::upsert) | Insert or replace vectors by chunk ID |
/// | [`search`](VectorStore::search) | Top-k by similarity within one document type |
/// | [`set_document_type`](VectorStore::set_document_type) | Re-tag a document's vectors |
/// | [`delete_document`](VectorStore::delete_document) | Remove a document's vectors |
/// | [`count`](VectorStore::count) | Number of stored vectors |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records; returns the number written.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize>;

    /// Return up to `top_k` hits tagged `document_type`, ranked with
    /// [`rank_hits`].
    async fn search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        document_type: DocumentType,
    ) -> Result<Vec<QueryHit>>;

    /// Move every vector of a document to `document_type`; returns the
    /// number of vectors touched.
    async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> Result<usize>;

    /// Remove every vector of a document; returns the number removed.
    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}

/// Sort hits by descending similarity and keep the first `top_k`.
///
/// Ties (and NaN scores) fall back to document ID, then chunk index, so
/// the order is reproducible across backends.
pub fn rank_hits(hits: &mut Vec<QueryHit>, top_k: usize) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
    hits.truncate(top_k);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc: &str, index: usize, score: f64) -> QueryHit {
        QueryHit {
            chunk_id: format!("{}-{}", doc, index),
            document_id: doc.to_string(),
            chunk_index: index,
            text: String::new(),
            document_type: DocumentType::Unknown,
            score,
        }
    }

    #[test]
    fn test_rank_hits_orders_and_breaks_ties() {
        let mut hits = vec![
            hit("b", 0, 0.5),
            hit("a", 2, 0.5),
            hit("a", 1, 0.5),
            hit("c", 0, 0.9),
        ];
        rank_hits(&mut hits, 3);
        let order: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(order, vec!["c-0", "a-1", "a-2"]);
    }
}
