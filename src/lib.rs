//! # docqa
//!
//! Question answering over uploaded documents.
//!
//! docqa ingests PDF, DOCX and email files, splits their text into
//! overlapping chunks, indexes the chunks as vectors tagged with a document
//! type, and answers questions by retrieving relevant chunks, scoring the
//! retrieval, and asking a language model for a cited answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌──────────────┐   ┌────────┐
//! │ Extractor │──▶│ Chunker │──▶│ Index client │──▶│ Vector │
//! │ PDF/DOCX/ │   └─────────┘   │ embed+batch  │   │ store  │
//! │ email     │                 └──────┬───────┘   └────────┘
//! └───────────┘                        │ top-k hits
//!                                      ▼
//!                   ┌────────┐   ┌─────────────┐
//!                   │ Scorer │──▶│ Synthesizer │──▶ Answer
//!                   └────────┘   └─────────────┘
//! ```
//!
//! Runtime-free logic (models, chunker, scorer, synthesizer, traits) lives
//! in the `docqa-core` crate; this crate adds I/O.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF, DOCX and email text extraction |
//! | [`db`] / [`migrate`] | SQLite pool and schema |
//! | [`sqlite_store`] | SQLite document store and vector store |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Answer providers |
//! | [`index`] | Vector index client |
//! | [`pipeline`] | Upload, embed, query, delete |
//! | [`server`] | HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod db;
pub mod documents;
pub mod embed_cmd;
pub mod embedding;
pub mod extract;
pub mod get;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod sqlite_store;
