//! In-memory [`VectorStore`] for tests and single-process deployments.
//!
//! Vectors live in a `Vec` behind a `RwLock`; search is brute-force cosine
//! similarity over every vector carrying the requested document type.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{DocumentType, QueryHit};

use super::{rank_hits, VectorRecord, VectorStore};

#[derive(Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("vector store lock poisoned"))?;
        let written = records.len();
        for record in records {
            stored.retain(|r| r.chunk_id != record.chunk_id);
            stored.push(record);
        }
        Ok(written)
    }

    async fn search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        document_type: DocumentType,
    ) -> Result<Vec<QueryHit>> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("vector store lock poisoned"))?;
        let mut hits: Vec<QueryHit> = stored
            .iter()
            .filter(|r| r.document_type == document_type)
            .map(|r| QueryHit {
                chunk_id: r.chunk_id.clone(),
                document_id: r.document_id.clone(),
                chunk_index: r.chunk_index,
                text: r.text.clone(),
                document_type: r.document_type,
                score: cosine_similarity(query_vec, &r.vector) as f64,
            })
            .collect();
        rank_hits(&mut hits, top_k);
        Ok(hits)
    }

    async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("vector store lock poisoned"))?;
        let mut touched = 0;
        for record in stored.iter_mut().filter(|r| r.document_id == document_id) {
            record.document_type = document_type;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("vector store lock poisoned"))?;
        let before = stored.len();
        stored.retain(|r| r.document_id != document_id);
        Ok(before - stored.len())
    }

    async fn count(&self) -> Result<usize> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("vector store lock poisoned"))?;
        Ok(stored.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc: &str, index: usize, t: DocumentType, v: Vec<f32>) -> VectorRecord {
        VectorRecord {
            chunk_id: format!("{}-{}", doc, index),
            document_id: doc.to_string(),
            chunk_index: index,
            text: format!("chunk {} of {}", index, doc),
            document_type: t,
            vector: v,
        }
    }

    #[tokio::test]
    async fn test_search_filters_by_type_and_ranks() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", 0, DocumentType::Unknown, vec![1.0, 0.0]),
                record("a", 1, DocumentType::Unknown, vec![0.6, 0.8]),
                record("b", 0, DocumentType::Known, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .search(&[1.0, 0.0], 5, DocumentType::Unknown)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "a-0");
        assert!(hits[0].score > hits[1].score);
        assert!(hits.iter().all(|h| h.document_type == DocumentType::Unknown));

        let known = store.search(&[1.0, 0.0], 1, DocumentType::Known).await.unwrap();
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].document_id, "b");
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_delete_removes() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", 0, DocumentType::Unknown, vec![1.0])])
            .await
            .unwrap();
        store
            .upsert(vec![record("a", 0, DocumentType::Known, vec![1.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        assert_eq!(store.delete_document("a").await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_document_type_moves_vectors_between_filters() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", 0, DocumentType::Unknown, vec![1.0, 0.0]),
                record("a", 1, DocumentType::Unknown, vec![0.0, 1.0]),
                record("b", 0, DocumentType::Unknown, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.set_document_type("a", DocumentType::Known).await.unwrap(), 2);
        assert_eq!(store.set_document_type("missing", DocumentType::Known).await.unwrap(), 0);

        let known = store.search(&[1.0, 0.0], 5, DocumentType::Known).await.unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.iter().all(|h| h.document_id == "a"));
        assert!(known.iter().all(|h| h.document_type == DocumentType::Known));

        let unknown = store.search(&[1.0, 0.0], 5, DocumentType::Unknown).await.unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].document_id, "b");
    }
}
