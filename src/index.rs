//! Vector index client.
//!
//! Sits between the pipeline and a [`VectorStore`]: embeds chunk text in
//! batches, tags every vector with its document type, and bounds each call
//! to the embedder or the store with a timeout.
//!
//! The write path ([`IndexClient::store`]) reports failures as
//! [`Error::IndexUnavailable`]. The read path ([`IndexClient::search`])
//! degrades: any failure is logged and yields an empty hit list, which the
//! scorer treats as the no-information case.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use docqa_core::embedding::EmbeddingProvider;
use docqa_core::index::{VectorRecord, VectorStore};
use docqa_core::models::{Chunk, DocumentType, QueryHit};
use docqa_core::{Error, Result};

pub struct IndexClient {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
    batch_size: usize,
    timeout: Duration,
}

impl IndexClient {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStore>,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            vectors,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// Embed and upsert `chunks` tagged with `document_type`.
    ///
    /// Returns the number of vectors written.
    pub async fn store(&self, chunks: &[Chunk], document_type: DocumentType) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        self.ensure_enabled()?;

        let mut written = 0;
        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.bounded("embedding", self.embedder.embed(&texts)).await?;
            if vectors.len() != batch.len() {
                return Err(Error::IndexUnavailable(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| VectorRecord::from_chunk(chunk, document_type, vector))
                .collect();
            written += self.bounded("vector upsert", self.vectors.upsert(records)).await?;
            debug!(batch = batch_no, written, total = chunks.len(), "stored vector batch");
        }

        Ok(written)
    }

    /// Search for `query`, surfacing failures as [`Error::IndexUnavailable`].
    pub async fn try_search(
        &self,
        query: &str,
        top_k: usize,
        document_type: DocumentType,
    ) -> Result<Vec<QueryHit>> {
        self.ensure_enabled()?;
        let query_vec = self
            .bounded("embedding", self.embedder.embed(&[query.to_string()]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::IndexUnavailable("empty embedding response".to_string()))?;
        self.bounded(
            "vector search",
            self.vectors.search(&query_vec, top_k, document_type),
        )
        .await
    }

    /// Search for `query`; any failure degrades to an empty result.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        document_type: DocumentType,
    ) -> Vec<QueryHit> {
        match self.try_search(query, top_k, document_type).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "vector search unavailable, continuing without context");
                Vec::new()
            }
        }
    }

    /// Re-tag a document's vectors; returns how many were touched.
    pub async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> Result<usize> {
        self.bounded(
            "vector re-tag",
            self.vectors.set_document_type(document_id, document_type),
        )
        .await
    }

    /// Remove a document's vectors.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        self.bounded("vector delete", self.vectors.delete_document(document_id))
            .await
    }

    pub async fn vector_count(&self) -> Result<usize> {
        self.bounded("vector count", self.vectors.count()).await
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.embedder.is_enabled() {
            Ok(())
        } else {
            Err(Error::IndexUnavailable(
                "embedding provider is disabled".to_string(),
            ))
        }
    }

    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::IndexUnavailable(format!("{} failed: {:#}", what, e))),
            Err(_) => Err(Error::IndexUnavailable(format!(
                "{} timed out after {:?}",
                what, self.timeout
            ))),
        }
    }
}
