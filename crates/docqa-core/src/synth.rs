//! Answer synthesis.
//!
//! The [`Synthesizer`] owns context assembly and the citation contract; the
//! text generation itself is delegated to an [`AnswerProvider`].
//!
//! # Citation contract
//!
//! Retrieved chunks are presented to the provider as numbered clauses
//! `[1]..[n]`. The provider must reply with a JSON object:
//!
//! ```json
//! {"answer": "...", "justification": "...", "matched_clauses": [1, 3]}
//! ```
//!
//! Clause numbers are resolved back to chunk text here, so the matched
//! clauses of an [`Answer`] are always verbatim members of the supplied
//! context. Unknown numbers are dropped and duplicates collapsed.
//!
//! Score details and confidence come from [`score::assess`], never from the
//! provider.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Answer, DocumentType, QueryHit};
use crate::score;

const SYSTEM_PROMPT: &str = "You answer questions about uploaded documents. \
Use only the numbered clauses provided. If they do not contain the answer, say so. \
Reply with a single JSON object with the keys \"answer\" (string), \
\"justification\" (string explaining which clauses support the answer) and \
\"matched_clauses\" (array of the clause numbers you relied on).";

/// A language-capability provider.
///
/// Implementations send the prompt to a model and return its raw reply.
/// They know nothing about clauses or scoring.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Provider identifier for logs and health reporting.
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn complete(&self, system: &str, prompt: &str) -> AnyResult<String>;
}

/// The shape a provider is asked to reply with.
#[derive(Debug, Deserialize)]
struct ProviderReply {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    justification: String,
    #[serde(default)]
    matched_clauses: Vec<serde_json::Value>,
}

/// Builds prompts, calls the provider and validates its reply.
pub struct Synthesizer<P: ?Sized> {
    provider: std::sync::Arc<P>,
}

impl<P: AnswerProvider + ?Sized> Synthesizer<P> {
    pub fn new(provider: std::sync::Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Produce an answer for `question` from the ranked `hits`.
    ///
    /// An empty hit list short-circuits to the no-information answer without
    /// calling the provider.
    pub async fn synthesize(
        &self,
        question: &str,
        document_type: DocumentType,
        hits: &[QueryHit],
    ) -> Result<Answer> {
        if hits.is_empty() {
            return Ok(score::no_information_answer(document_type));
        }

        let assessment = score::assess(hits, document_type);
        let prompt = build_prompt(question, hits);
        debug!(
            provider = self.provider.name(),
            clauses = hits.len(),
            "requesting answer"
        );

        let raw = self
            .provider
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| Error::SynthesisFailed(format!("{:#}", e)))?;

        let reply = parse_reply(&raw)?;
        let answer = reply.answer.trim();
        if answer.is_empty() {
            return Err(Error::SynthesisFailed(
                "provider returned an empty answer".to_string(),
            ));
        }

        Ok(Answer {
            answer: answer.to_string(),
            justification: reply.justification.trim().to_string(),
            matched_clauses: resolve_clauses(&reply.matched_clauses, hits),
            score_details: assessment.details,
            confidence: assessment.confidence,
        })
    }
}

/// Render the question and numbered clauses as the user prompt.
pub fn build_prompt(question: &str, hits: &[QueryHit]) -> String {
    let mut prompt = String::from("Clauses:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n\n", i + 1, hit.text.trim()));
    }
    prompt.push_str("Question: ");
    prompt.push_str(question.trim());
    prompt.push('\n');
    prompt
}

/// Parse a provider reply, tolerating code fences and prose around the
/// JSON object.
fn parse_reply(raw: &str) -> Result<ProviderReply> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &raw[s..=e],
        _ => {
            return Err(Error::SynthesisFailed(
                "provider reply contains no JSON object".to_string(),
            ))
        }
    };
    serde_json::from_str(body)
        .map_err(|e| Error::SynthesisFailed(format!("unparseable provider reply: {}", e)))
}

/// Map cited clause numbers (1-based) to the text of the supplied hits.
fn resolve_clauses(cited: &[serde_json::Value], hits: &[QueryHit]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut clauses = Vec::new();
    for value in cited {
        let number = match clause_number(value) {
            Some(n) if n >= 1 && n <= hits.len() => n,
            _ => {
                warn!(citation = %value, "dropping citation outside the supplied context");
                continue;
            }
        };
        if seen.contains(&number) {
            continue;
        }
        seen.push(number);
        clauses.push(hits[number - 1].text.clone());
    }
    clauses
}

fn clause_number(value: &serde_json::Value) -> Option<usize> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
        serde_json::Value::String(s) => s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}
