//! Error taxonomy shared by every pipeline stage.
//!
//! Each variant maps to a stable machine-readable code (see [`Error::code`])
//! so that the HTTP layer and the CLI can report distinct failures without
//! inspecting message text.

use thiserror::Error;

/// Convenience alias used across the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The declared file kind or extension is not one we can extract.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bytes could not be parsed as the declared kind.
    #[error("corrupt input: {0}")]
    CorruptInput(String),

    /// Extraction succeeded but produced no non-whitespace text.
    #[error("document contains no extractable text")]
    EmptyContent,

    /// The chunker was misconfigured or could not split the text.
    #[error("chunking failed: {0}")]
    ChunkingFailure(String),

    /// The embedder or vector store failed or timed out.
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// The language-capability provider failed, timed out, or replied
    /// with something unusable.
    #[error("answer synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Unknown document ID.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Malformed request (empty question, bad document type, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The metadata store backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::CorruptInput(_) => "corrupt_input",
            Error::EmptyContent => "empty_content",
            Error::ChunkingFailure(_) => "chunking_failure",
            Error::IndexUnavailable(_) => "index_unavailable",
            Error::SynthesisFailed(_) => "synthesis_failed",
            Error::NotFound(_) => "not_found",
            Error::InvalidRequest(_) => "bad_request",
            Error::Storage(_) => "storage_error",
        }
    }

    /// Wrap a store backend failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }
}
