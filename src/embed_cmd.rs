//! `dqa embed`: push a stored document's chunks into the vector index.

use anyhow::{bail, Result};

use docqa_core::models::DocumentType;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn run_embed(
    config: &Config,
    document_id: &str,
    document_type: Option<DocumentType>,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let pipeline = Pipeline::from_config(config).await?;
    let receipt = pipeline.embed(document_id, document_type).await?;

    println!("embed {}", receipt.document_id);
    println!("  chunks processed: {}", receipt.chunks_processed);
    println!("  vectors stored:   {}", receipt.vectors_stored);
    Ok(())
}
