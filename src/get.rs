//! `dqa get`: print a document's metadata and chunks.

use anyhow::Result;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let detail = pipeline.get(id).await?;
    let doc = &detail.document;

    println!("--- Document ---");
    println!("id:            {}", doc.id);
    println!("filename:      {}", doc.filename);
    println!("file_type:     {}", doc.file_type);
    println!("document_type: {}", doc.document_type);
    println!(
        "upload_time:   {}",
        doc.upload_time.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!();

    println!("--- Chunks ({}) ---", detail.chunks.len());
    for chunk in &detail.chunks {
        println!(
            "[chunk {} chars {}..{}]",
            chunk.chunk_index, chunk.char_start, chunk.char_end
        );
        println!("{}", chunk.text);
        println!();
    }

    Ok(())
}
