//! Core data models used throughout docqa.
//!
//! These types represent the documents, chunks, retrieval hits and answers
//! that flow through the ingestion and query pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// File extensions accepted at the ingestion boundary.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "eml", "email"];

/// Declared kind of an uploaded file, resolved from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Email,
}

impl FileKind {
    /// Resolve a file extension (case-insensitive, with or without a
    /// leading dot) against the allow-list.
    pub fn from_extension(ext: &str) -> Result<Self, Error> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" | "doc" => Ok(FileKind::Docx),
            "eml" | "email" => Ok(FileKind::Email),
            other => Err(Error::UnsupportedFormat(format!(
                "'{}' is not one of: {}",
                other,
                ALLOWED_EXTENSIONS.join(", ")
            ))),
        }
    }

    /// Resolve the kind from a filename's extension.
    pub fn from_filename(filename: &str) -> Result<Self, Error> {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Err(Error::UnsupportedFormat(format!(
                "'{}' has no file extension",
                filename
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Email => "email",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
    }
}

/// Coarse classification of a document that drives score weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Known,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Known => "known",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "known" => Ok(DocumentType::Known),
            "unknown" => Ok(DocumentType::Unknown),
            other => Err(Error::InvalidRequest(format!(
                "document_type must be 'known' or 'unknown', got '{}'",
                other
            ))),
        }
    }
}

/// Metadata for an ingested document.
///
/// Everything except `document_type` is fixed at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "document_id")]
    pub id: String,
    pub filename: String,
    pub file_type: FileKind,
    pub upload_time: DateTime<Utc>,
    pub total_chunks: usize,
    pub document_type: DocumentType,
}

/// A passage of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic UUID derived from `document_id` and `chunk_index`.
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
    /// Character offset (not byte offset) of the first character.
    pub char_start: usize,
    /// Character offset one past the last character.
    pub char_end: usize,
}

/// A ranked retrieval hit returned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub chunk_id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub document_type: DocumentType,
    /// Raw similarity from the index (cosine for the bundled backends).
    pub score: f64,
}

/// Weighting breakdown reported with every answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub document_type: DocumentType,
    pub question_weight: f64,
    pub document_weight: f64,
    pub score: f64,
}

/// Final answer returned to callers. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub justification: String,
    pub matched_clauses: Vec<String>,
    pub score_details: ScoreDetails,
    pub confidence: f64,
}

/// Query request shape accepted by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub document_type: DocumentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_from_extension_allow_list() {
        assert_eq!(FileKind::from_extension("PDF").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_extension(".docx").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_extension("doc").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_extension("eml").unwrap(), FileKind::Email);
        assert_eq!(FileKind::from_extension("email").unwrap(), FileKind::Email);
        assert!(matches!(
            FileKind::from_extension("txt"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn file_kind_from_filename() {
        assert_eq!(
            FileKind::from_filename("policy.final.pdf").unwrap(),
            FileKind::Pdf
        );
        assert!(matches!(
            FileKind::from_filename("README"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn document_type_parse_and_default() {
        assert_eq!(DocumentType::default(), DocumentType::Unknown);
        assert_eq!("Known".parse::<DocumentType>().unwrap(), DocumentType::Known);
        assert!("maybe".parse::<DocumentType>().is_err());
    }

    #[test]
    fn query_request_defaults_to_unknown() {
        let req: QueryRequest = serde_json::from_str(r#"{"question": "what?"}"#).unwrap();
        assert_eq!(req.document_type, DocumentType::Unknown);

        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "what?", "document_type": "known"}"#).unwrap();
        assert_eq!(req.document_type, DocumentType::Known);
    }
}
