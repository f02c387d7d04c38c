//! # docqa core
//!
//! Runtime-free logic for docqa: data models, the error taxonomy, the
//! recursive chunker, the relevance scorer, the answer-synthesis contract,
//! and the storage / vector-index / embedding traits together with their
//! in-memory implementations.
//!
//! This crate contains no tokio, sqlx, HTTP or filesystem I/O. Concrete
//! backends (SQLite, OpenAI, Ollama) live in the `docqa` app crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod score;
pub mod store;
pub mod synth;

pub use error::{Error, Result};
