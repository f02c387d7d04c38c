//! `dqa upload`: ingest a file from disk.

use std::path::Path;

use anyhow::{Context, Result};

use docqa_core::models::DocumentType;

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Upload `path`, optionally embedding it straight away.
pub async fn run_upload(
    config: &Config,
    path: &Path,
    embed: bool,
    document_type: DocumentType,
) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let pipeline = Pipeline::from_config(config).await?;
    let receipt = pipeline.upload(&filename, &bytes, document_type).await?;

    println!("upload {}", receipt.filename);
    println!("  document_id: {}", receipt.document_id);
    println!("  chunks:      {}", receipt.total_chunks);
    println!("  {}", receipt.message);

    if embed {
        let embedded = pipeline.embed(&receipt.document_id, None).await?;
        println!("  vectors:     {}", embedded.vectors_stored);
    }

    Ok(())
}
