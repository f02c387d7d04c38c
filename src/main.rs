//! # docqa CLI (`dqa`)
//!
//! Ingest PDF, DOCX and email documents, index them, and ask questions
//! answered from their contents with a weighted confidence score.
//!
//! ## Usage
//!
//! ```bash
//! dqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dqa init` | Create the SQLite database and run schema migrations |
//! | `dqa upload <path>` | Extract, chunk and store a document |
//! | `dqa embed <id>` | Embed a document's chunks into the vector index |
//! | `dqa query "<question>"` | Answer a question from indexed documents |
//! | `dqa list` | List documents |
//! | `dqa get <id>` | Show a document and its chunks |
//! | `dqa set-type <id> <type>` | Correct a document's type |
//! | `dqa delete <id>` | Delete a document |
//! | `dqa serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! dqa init
//! dqa upload ./policy.pdf --embed --document-type known
//! dqa query "What is the grace period?" --document-type known
//! dqa serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docqa::{config, documents, embed_cmd, get, ingest, logging, migrate, query, server};
use docqa_core::models::DocumentType;

/// docqa: question answering over uploaded documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docqa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dqa",
    about = "docqa: question answering over PDF, DOCX and email documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Extract, chunk and store a document.
    Upload {
        /// File to upload (.pdf, .docx, .doc, .eml, .email).
        path: PathBuf,

        /// Embed the document right after storing it.
        #[arg(long)]
        embed: bool,

        /// Document type: `known` or `unknown`.
        #[arg(long, default_value = "unknown")]
        document_type: DocumentType,
    },

    /// Embed a stored document's chunks into the vector index.
    ///
    /// Requires an embedding provider to be configured.
    Embed {
        /// Document ID.
        id: String,

        /// Re-tag the document before embedding.
        #[arg(long)]
        document_type: Option<DocumentType>,
    },

    /// Answer a question from the indexed documents.
    Query {
        /// The question.
        question: String,

        /// Only search documents of this type.
        #[arg(long, default_value = "unknown")]
        document_type: DocumentType,

        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List uploaded documents, newest first.
    List,

    /// Show a document's metadata and chunks.
    Get {
        /// Document ID.
        id: String,
    },

    /// Correct a document's type.
    SetType {
        /// Document ID.
        id: String,
        /// `known` or `unknown`.
        document_type: DocumentType,
    },

    /// Delete a document and its vectors.
    Delete {
        /// Document ID.
        id: String,
    },

    /// Start the HTTP API server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Upload {
            path,
            embed,
            document_type,
        } => {
            ingest::run_upload(&cfg, &path, embed, document_type).await?;
        }
        Commands::Embed { id, document_type } => {
            embed_cmd::run_embed(&cfg, &id, document_type).await?;
        }
        Commands::Query {
            question,
            document_type,
            json,
        } => {
            query::run_query(&cfg, &question, document_type, json).await?;
        }
        Commands::List => {
            documents::run_list(&cfg).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::SetType { id, document_type } => {
            documents::run_set_type(&cfg, &id, document_type).await?;
        }
        Commands::Delete { id } => {
            documents::run_delete(&cfg, &id).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
