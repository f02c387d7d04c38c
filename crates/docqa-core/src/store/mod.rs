//! Storage abstraction for document metadata and chunks.
//!
//! The [`DocumentStore`] trait defines the operations the ingestion and
//! query pipeline needs from its metadata store, enabling pluggable
//! backends (SQLite in the app crate, in-memory here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, Document, DocumentType};

/// Abstract metadata backend.
///
/// All operations are async (via `async-trait`); in-memory implementations
/// return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put_document`](DocumentStore::put_document) | Store a document with its chunks |
/// | [`get_document`](DocumentStore::get_document) | Look up document metadata |
/// | [`list_documents`](DocumentStore::list_documents) | All documents, newest first |
/// | [`get_chunks`](DocumentStore::get_chunks) | A document's chunks in index order |
/// | [`set_document_type`](DocumentStore::set_document_type) | Correct the type tag |
/// | [`delete_document`](DocumentStore::delete_document) | Remove metadata and record a tombstone |
/// | [`deleted_ids`](DocumentStore::deleted_ids) | Tombstoned document IDs |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and replace any chunks stored under its ID.
    async fn put_document(&self, doc: &Document, chunks: &[Chunk]) -> Result<()>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Documents ordered by upload time, newest first.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Chunks of a document ordered by `chunk_index`. Empty for unknown IDs.
    async fn get_chunks(&self, document_id: &str) -> Result<Vec<Chunk>>;

    /// Update the type tag. Returns `false` when the document does not exist.
    async fn set_document_type(&self, id: &str, document_type: DocumentType) -> Result<bool>;

    /// Remove a document and its chunks, recording a tombstone.
    /// Returns `false` when the document does not exist.
    async fn delete_document(&self, id: &str) -> Result<bool>;

    /// IDs of every deleted document.
    async fn deleted_ids(&self) -> Result<Vec<String>>;
}
