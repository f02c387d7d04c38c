//! `dqa query`: answer a question from the indexed documents.

use anyhow::Result;

use docqa_core::models::{Answer, DocumentType, QueryRequest};

use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn run_query(
    config: &Config,
    question: &str,
    document_type: DocumentType,
    json: bool,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let answer = pipeline
        .query(&QueryRequest {
            question: question.to_string(),
            document_type,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("--- Answer ---");
    println!("{}", answer.answer);
    println!();
    println!("--- Justification ---");
    println!("{}", answer.justification);
    println!();

    if !answer.matched_clauses.is_empty() {
        println!("--- Matched clauses ({}) ---", answer.matched_clauses.len());
        for (i, clause) in answer.matched_clauses.iter().enumerate() {
            println!("[{}] {}", i + 1, clause.trim());
        }
        println!();
    }

    let details = &answer.score_details;
    println!(
        "document_type: {}  question_weight: {:.1}  document_weight: {:.1}",
        details.document_type, details.question_weight, details.document_weight
    );
    println!(
        "score: {:.3}  confidence: {:.3}",
        details.score, answer.confidence
    );
}
