//! Document management commands: `dqa list`, `dqa delete`, `dqa set-type`.

use anyhow::Result;

use docqa_core::models::DocumentType;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn run_list(config: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let documents = pipeline.list().await?;

    if documents.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    for doc in &documents {
        println!(
            "{}  {:<7} {:<5} {:>4} chunks  {}  {}",
            doc.id,
            doc.document_type,
            doc.file_type,
            doc.total_chunks,
            doc.upload_time.format("%Y-%m-%d %H:%M"),
            doc.filename
        );
    }
    println!("total: {}", documents.len());
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    pipeline.delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn run_set_type(config: &Config, id: &str, document_type: DocumentType) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let doc = pipeline.set_document_type(id, document_type).await?;
    println!("{} is now '{}'", doc.id, doc.document_type);
    Ok(())
}
