//! Ingestion and query pipeline.
//!
//! [`Pipeline`] wires the extractor, chunker, metadata store, index client
//! and answer synthesizer together. The CLI and the HTTP server are thin
//! shells over its operations:
//!
//! | Operation | Path |
//! |-----------|------|
//! | [`upload`](Pipeline::upload) | bytes → text → chunks → metadata store |
//! | [`embed`](Pipeline::embed) | stored chunks → vectors in the index |
//! | [`query`](Pipeline::query) | question → hits → score → answer |
//! | [`delete`](Pipeline::delete) | metadata + tombstone, then vectors (best effort) |
//!
//! Backend failures are converted into the [`docqa_core::Error`] taxonomy
//! here, at the boundary.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docqa_core::chunk::Chunker;
use docqa_core::models::{Answer, Chunk, Document, DocumentType, QueryHit, QueryRequest};
use docqa_core::store::DocumentStore;
use docqa_core::synth::{AnswerProvider, Synthesizer};
use docqa_core::{Error, Result};

use crate::config::Config;
use crate::extract;
use crate::index::IndexClient;
use crate::sqlite_store::SqliteStore;
use crate::{db, embedding, llm, migrate};

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub document_id: String,
    pub status: String,
    pub message: String,
    pub total_chunks: usize,
}

/// Result of embedding a document's chunks.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedReceipt {
    pub document_id: String,
    pub status: String,
    pub chunks_processed: usize,
    pub vectors_stored: usize,
    pub message: String,
}

/// Document metadata together with its chunks.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub services: ServiceHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub document_processor: String,
    pub embedding_service: String,
    pub llm_service: String,
}

pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    index: IndexClient,
    synthesizer: Synthesizer<dyn AnswerProvider>,
    chunker: Chunker,
    top_k: usize,
    llm_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: IndexClient,
        answer_provider: Arc<dyn AnswerProvider>,
        chunker: Chunker,
        top_k: usize,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            store,
            index,
            synthesizer: Synthesizer::new(answer_provider),
            chunker,
            top_k: top_k.max(1),
            llm_timeout,
        }
    }

    /// Open the SQLite store (migrating it if needed) and build the
    /// configured providers.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        let sqlite = Arc::new(SqliteStore::new(pool));

        let index = IndexClient::new(
            embedding::create_provider(&config.embedding)?,
            sqlite.clone(),
            config.embedding.batch_size,
            Duration::from_secs(config.retrieval.timeout_secs),
        );
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;

        Ok(Self::new(
            sqlite,
            index,
            llm::create_provider(&config.llm)?,
            chunker,
            config.retrieval.top_k,
            Duration::from_secs(config.llm.timeout_secs),
        ))
    }

    /// Extract, chunk and store an uploaded file.
    ///
    /// A file with no extractable text is still stored, with zero chunks.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        document_type: DocumentType,
    ) -> Result<UploadReceipt> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(Error::InvalidRequest("filename is required".to_string()));
        }

        let (file_type, text) = match extract::extract_file(bytes, filename) {
            Ok(extracted) => extracted,
            Err(Error::EmptyContent) => {
                warn!(filename, "no extractable text, storing empty document");
                (
                    docqa_core::models::FileKind::from_filename(filename)?,
                    String::new(),
                )
            }
            Err(e) => return Err(e),
        };

        let document_id = Uuid::new_v4().to_string();
        let chunks = self.chunker.chunk_document(&document_id, &text);
        let document = Document {
            id: document_id.clone(),
            filename: filename.to_string(),
            file_type,
            upload_time: Utc::now(),
            total_chunks: chunks.len(),
            document_type,
        };

        self.store
            .put_document(&document, &chunks)
            .await
            .map_err(Error::storage)?;

        info!(
            document_id = %document_id,
            filename,
            file_type = %file_type,
            chunks = chunks.len(),
            "document ingested"
        );

        let message = if chunks.is_empty() {
            "Document stored, but it contains no extractable text. 0 chunks created.".to_string()
        } else {
            format!(
                "Document processed successfully. {} chunks created.",
                chunks.len()
            )
        };

        Ok(UploadReceipt {
            filename: filename.to_string(),
            document_id,
            status: "success".to_string(),
            message,
            total_chunks: chunks.len(),
        })
    }

    /// Embed a stored document's chunks into the index.
    ///
    /// When `document_type` is given it also becomes the document's tag.
    pub async fn embed(
        &self,
        document_id: &str,
        document_type: Option<DocumentType>,
    ) -> Result<EmbedReceipt> {
        let document = self.require_document(document_id).await?;
        let document_type = match document_type {
            Some(t) if t != document.document_type => {
                self.store
                    .set_document_type(document_id, t)
                    .await
                    .map_err(Error::storage)?;
                t
            }
            Some(t) => t,
            None => document.document_type,
        };

        let chunks = self
            .store
            .get_chunks(document_id)
            .await
            .map_err(Error::storage)?;
        let vectors_stored = self.index.store(&chunks, document_type).await?;

        info!(
            document_id,
            document_type = %document_type,
            vectors = vectors_stored,
            model = self.index.embedder().model_name(),
            "document embedded"
        );

        Ok(EmbedReceipt {
            document_id: document_id.to_string(),
            status: "success".to_string(),
            chunks_processed: chunks.len(),
            vectors_stored,
            message: "Embeddings generated successfully".to_string(),
        })
    }

    /// Answer a question from the indexed documents of the requested type.
    pub async fn query(&self, request: &QueryRequest) -> Result<Answer> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }

        let deleted: HashSet<String> = self
            .store
            .deleted_ids()
            .await
            .map_err(Error::storage)?
            .into_iter()
            .collect();

        let hits = self
            .live_hits(question, request.document_type, &deleted)
            .await;

        let synthesis = self
            .synthesizer
            .synthesize(question, request.document_type, &hits);
        let answer = match tokio::time::timeout(self.llm_timeout, synthesis).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::SynthesisFailed(format!(
                    "provider timed out after {:?}",
                    self.llm_timeout
                )))
            }
        };

        info!(
            hits = hits.len(),
            document_type = %request.document_type,
            confidence = answer.confidence,
            cited = answer.matched_clauses.len(),
            "query answered"
        );
        Ok(answer)
    }

    /// The top k hits for `question` once deleted documents are filtered out.
    ///
    /// The index is asked for exactly k hits. The request is widened only
    /// while lagging vectors of deleted documents crowd live hits out, and
    /// stops once k live hits remain or the index has nothing more to give.
    async fn live_hits(
        &self,
        question: &str,
        document_type: DocumentType,
        deleted: &HashSet<String>,
    ) -> Vec<QueryHit> {
        let mut fetch = self.top_k;
        loop {
            let mut hits = self.index.search(question, fetch, document_type).await;
            let returned = hits.len();
            hits.retain(|h| !deleted.contains(&h.document_id));
            let dropped = returned - hits.len();

            if dropped == 0 || hits.len() >= self.top_k || returned < fetch {
                hits.retain(|h| !h.text.trim().is_empty());
                hits.truncate(self.top_k);
                return hits;
            }
            debug!(fetch, dropped, "deleted documents in hits, widening search");
            fetch *= 2;
        }
    }

    pub async fn list(&self) -> Result<Vec<Document>> {
        self.store.list_documents().await.map_err(Error::storage)
    }

    pub async fn get(&self, document_id: &str) -> Result<DocumentDetail> {
        let document = self.require_document(document_id).await?;
        let chunks = self
            .store
            .get_chunks(document_id)
            .await
            .map_err(Error::storage)?;
        Ok(DocumentDetail { document, chunks })
    }

    /// Correct a document's type tag, in the metadata store and on its
    /// vectors.
    ///
    /// Failing to re-tag the vectors is logged, not returned; embedding the
    /// document again repairs the index.
    pub async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> Result<Document> {
        let found = self
            .store
            .set_document_type(document_id, document_type)
            .await
            .map_err(Error::storage)?;
        if !found {
            return Err(Error::NotFound(document_id.to_string()));
        }

        match self.index.set_document_type(document_id, document_type).await {
            Ok(retagged) => info!(
                document_id,
                document_type = %document_type,
                vectors = retagged,
                "document re-tagged"
            ),
            Err(e) => warn!(
                document_id,
                error = %e,
                "document re-tagged, vectors keep the old type"
            ),
        }
        self.require_document(document_id).await
    }

    /// Delete a document's metadata and chunks, then its vectors.
    ///
    /// Vector deletion failing is logged, not returned: the tombstone keeps
    /// the lagging vectors out of query results.
    pub async fn delete(&self, document_id: &str) -> Result<()> {
        let deleted = self
            .store
            .delete_document(document_id)
            .await
            .map_err(Error::storage)?;
        if !deleted {
            return Err(Error::NotFound(document_id.to_string()));
        }

        match self.index.delete_document(document_id).await {
            Ok(removed) => info!(document_id, vectors = removed, "document deleted"),
            Err(e) => warn!(document_id, error = %e, "document deleted, vectors left behind"),
        }
        Ok(())
    }

    pub async fn health(&self) -> HealthReport {
        let embedder = self.index.embedder();
        let embedding_service = if !embedder.is_enabled() {
            "disabled".to_string()
        } else {
            match self.index.vector_count().await {
                Ok(_) => "available".to_string(),
                Err(e) => {
                    warn!(error = %e, "vector index health check failed");
                    "unavailable".to_string()
                }
            }
        };
        let llm_service = if self.synthesizer.provider().is_enabled() {
            "available"
        } else {
            "disabled"
        };

        HealthReport {
            status: "healthy".to_string(),
            services: ServiceHealth {
                document_processor: "available".to_string(),
                embedding_service,
                llm_service: llm_service.to_string(),
            },
        }
    }

    async fn require_document(&self, document_id: &str) -> Result<Document> {
        self.store
            .get_document(document_id)
            .await
            .map_err(Error::storage)?
            .ok_or_else(|| Error::NotFound(document_id.to_string()))
    }
}
