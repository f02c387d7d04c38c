//! Fakes and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use docqa::index::IndexClient;
use docqa::pipeline::Pipeline;
use docqa_core::chunk::Chunker;
use docqa_core::embedding::EmbeddingProvider;
use docqa_core::index::memory::InMemoryVectorStore;
use docqa_core::index::{VectorRecord, VectorStore};
use docqa_core::models::{DocumentType, QueryHit};
use docqa_core::store::memory::InMemoryStore;
use docqa_core::synth::AnswerProvider;

const DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase word is hashed into one of 64
/// buckets.
pub struct KeywordEmbedder;

fn bucket(word: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for word in text
                    .to_lowercase()
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    v[bucket(word)] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Answers every question citing every clause it was shown, plus one
/// out-of-range clause number.
pub struct CitingProvider {
    pub prompts: Mutex<Vec<String>>,
}

impl CitingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AnswerProvider for CitingProvider {
    fn name(&self) -> &str {
        "citing"
    }
    async fn complete(&self, _system: &str, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let clauses = prompt
            .lines()
            .filter(|l| l.starts_with('['))
            .count();
        let mut cited: Vec<usize> = (1..=clauses).collect();
        cited.push(clauses + 7);
        Ok(serde_json::json!({
            "answer": "Claims must be filed within thirty days.",
            "justification": "Stated in the cited clauses.",
            "matched_clauses": cited,
        })
        .to_string())
    }
}

pub struct FailingProvider;

#[async_trait]
impl AnswerProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }
    async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("upstream returned 500")
    }
}

pub struct SlowProvider;

#[async_trait]
impl AnswerProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }
    async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("{}".to_string())
    }
}

/// Vector store whose deletes always fail, leaving vectors behind. It
/// records the `top_k` of every search.
pub struct StickyVectorStore {
    pub inner: InMemoryVectorStore,
    pub searches: Mutex<Vec<usize>>,
}

impl StickyVectorStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryVectorStore::new(),
            searches: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VectorStore for StickyVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> anyhow::Result<usize> {
        self.inner.upsert(records).await
    }
    async fn search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        document_type: DocumentType,
    ) -> anyhow::Result<Vec<QueryHit>> {
        self.searches.lock().unwrap().push(top_k);
        self.inner.search(query_vec, top_k, document_type).await
    }
    async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> anyhow::Result<usize> {
        self.inner.set_document_type(document_id, document_type).await
    }
    async fn delete_document(&self, _document_id: &str) -> anyhow::Result<usize> {
        anyhow::bail!("vector index is read-only right now")
    }
    async fn count(&self) -> anyhow::Result<usize> {
        self.inner.count().await
    }
}

pub fn pipeline_with(
    vectors: Arc<dyn VectorStore>,
    provider: Arc<dyn AnswerProvider>,
    llm_timeout: Duration,
) -> Pipeline {
    let index = IndexClient::new(
        Arc::new(KeywordEmbedder),
        vectors,
        4,
        Duration::from_secs(5),
    );
    Pipeline::new(
        Arc::new(InMemoryStore::new()),
        index,
        provider,
        Chunker::new(200, 40).unwrap(),
        5,
        llm_timeout,
    )
}

pub fn pipeline(provider: Arc<dyn AnswerProvider>) -> Pipeline {
    pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        provider,
        Duration::from_secs(5),
    )
}

pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

pub fn email(subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: claims@example.com\r\nTo: holder@example.com\r\nSubject: {}\r\n\r\n{}\r\n",
        subject, body
    )
    .into_bytes()
}
