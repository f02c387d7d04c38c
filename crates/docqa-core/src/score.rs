//! Relevance scoring and confidence.
//!
//! Turns a ranked list of retrieval hits into an interpretable score and a
//! `[0, 1]` confidence, weighted by the question and document type.
//!
//! # Weights
//!
//! | document_type | question_weight | document_weight |
//! |---|---|---|
//! | unknown | 2.0 | 2.0 |
//! | known   | 2.0 | 0.5 |
//!
//! # Formula
//!
//! ```text
//! strength   = mean(clamp(similarity_i, 0, 1))
//! score      = strength × (question_weight + document_weight) / 2
//! confidence = clamp(score / MAX_COMBINED_WEIGHT, 0, 1)
//! ```
//!
//! Both values are monotone non-decreasing in retrieval strength for fixed
//! weights. An empty hit list is a defined terminal state with score and
//! confidence exactly `0.0` (see [`no_information_answer`]).

use crate::models::{Answer, DocumentType, QueryHit, ScoreDetails};

pub const QUESTION_WEIGHT: f64 = 2.0;
pub const KNOWN_DOCUMENT_WEIGHT: f64 = 0.5;
pub const UNKNOWN_DOCUMENT_WEIGHT: f64 = 2.0;

/// Largest `(question_weight + document_weight) / 2` in the weight table.
const MAX_COMBINED_WEIGHT: f64 = 2.0;

pub const NO_INFORMATION_ANSWER: &str =
    "No relevant information found in the uploaded documents for your question.";
pub const NO_INFORMATION_JUSTIFICATION: &str =
    "The search did not return any relevant document chunks for your query.";

/// Question/document weight pair for a document type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub question: f64,
    pub document: f64,
}

impl Weights {
    pub fn for_type(document_type: DocumentType) -> Self {
        let document = match document_type {
            DocumentType::Known => KNOWN_DOCUMENT_WEIGHT,
            DocumentType::Unknown => UNKNOWN_DOCUMENT_WEIGHT,
        };
        Self {
            question: QUESTION_WEIGHT,
            document,
        }
    }

    fn combined(&self) -> f64 {
        (self.question + self.document) / 2.0
    }
}

/// Score and confidence computed for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub retrieval_strength: f64,
    pub details: ScoreDetails,
    pub confidence: f64,
}

/// Mean similarity of the hits, each clamped to `[0, 1]`. NaN counts as 0.
pub fn retrieval_strength(hits: &[QueryHit]) -> f64 {
    if hits.is_empty() {
        return 0.0;
    }
    let sum: f64 = hits.iter().map(|h| clamp_unit(h.score)).sum();
    sum / hits.len() as f64
}

/// Combine retrieval strength with the type weights.
pub fn weighted_score(strength: f64, weights: Weights) -> f64 {
    clamp_unit(strength) * weights.combined()
}

/// Map a weighted score onto `[0, 1]`.
pub fn confidence(score: f64) -> f64 {
    clamp_unit(score / MAX_COMBINED_WEIGHT)
}

/// Score a ranked hit list for the given document type.
pub fn assess(hits: &[QueryHit], document_type: DocumentType) -> Assessment {
    let weights = Weights::for_type(document_type);
    let strength = retrieval_strength(hits);
    let score = weighted_score(strength, weights);

    Assessment {
        retrieval_strength: strength,
        details: ScoreDetails {
            document_type,
            question_weight: weights.question,
            document_weight: weights.document,
            score,
        },
        confidence: confidence(score),
    }
}

/// The answer returned when retrieval produced nothing usable.
pub fn no_information_answer(document_type: DocumentType) -> Answer {
    let weights = Weights::for_type(document_type);
    Answer {
        answer: NO_INFORMATION_ANSWER.to_string(),
        justification: NO_INFORMATION_JUSTIFICATION.to_string(),
        matched_clauses: Vec::new(),
        score_details: ScoreDetails {
            document_type,
            question_weight: weights.question,
            document_weight: weights.document,
            score: 0.0,
        },
        confidence: 0.0,
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
