//! In-memory [`DocumentStore`] implementation for tests and embedding.
//!
//! Uses `HashMap` behind `std::sync::RwLock` for thread safety.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Chunk, Document, DocumentType};

use super::DocumentStore;

#[derive(Default)]
struct State {
    docs: HashMap<String, Document>,
    chunks: HashMap<String, Vec<Chunk>>,
    tombstones: HashSet<String>,
}

/// In-memory metadata store.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| anyhow!("store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| anyhow!("store lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn put_document(&self, doc: &Document, chunks: &[Chunk]) -> Result<()> {
        let mut state = self.write()?;
        let mut sorted = chunks.to_vec();
        sorted.sort_by_key(|c| c.chunk_index);
        state.tombstones.remove(&doc.id);
        state.chunks.insert(doc.id.clone(), sorted);
        state.docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.read()?.docs.get(id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let state = self.read()?;
        let mut docs: Vec<Document> = state.docs.values().cloned().collect();
        docs.sort_by(|a, b| {
            b.upload_time
                .cmp(&a.upload_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(docs)
    }

    async fn get_chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .read()?
            .chunks
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_document_type(&self, id: &str, document_type: DocumentType) -> Result<bool> {
        let mut state = self.write()?;
        match state.docs.get_mut(id) {
            Some(doc) => {
                doc.document_type = document_type;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let mut state = self.write()?;
        if state.docs.remove(id).is_none() {
            return Ok(false);
        }
        state.chunks.remove(id);
        state.tombstones.insert(id.to_string());
        Ok(true)
    }

    async fn deleted_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read()?.tombstones.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
