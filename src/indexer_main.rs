use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use pdot_context::core::config::{AppPaths, ConfigService, Secrets};
use pdot_context::core::logging;
use pdot_context::llm::GoogleEmbeddings;
use pdot_context::rag::indexer::SkipReason;
use pdot_context::rag::{EntityCatalog, Indexer, PdfLoader, RecursiveSplitter};

/// Rebuilds the PDOT vector store from the configured PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdot-indexer", version)]
struct Cli {
    /// Config file (defaults to PDOT_CONFIG_PATH or ./config.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the PDF files
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    /// Vector store directory; deleted and rebuilt
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut paths = AppPaths::new();
    if let Some(config) = cli.config {
        paths.config_path = config;
    }
    let paths = Arc::new(paths);
    logging::init(&paths, "indexer.log");

    let settings = ConfigService::new(paths.clone())
        .load_settings()
        .with_context(|| format!("Failed to load config {}", paths.config_path.display()))?;

    let api_key = Secrets::from_env(&paths.env_file).require_embeddings()?;
    let embeddings = GoogleEmbeddings::new(&settings.embeddings, api_key)?;

    let documents_dir = cli
        .documents_dir
        .unwrap_or_else(|| paths.resolve(&settings.indexer.documents_dir));
    let store_dir = cli
        .store_dir
        .unwrap_or_else(|| paths.resolve(&settings.store.directory));

    let catalog = EntityCatalog::from_map(&settings.entities);
    let splitter = RecursiveSplitter::new(settings.indexer.chunk_size, settings.indexer.chunk_overlap);
    let indexer = Indexer::new(Arc::new(PdfLoader::new()), Arc::new(embeddings), splitter)
        .with_batch_size(settings.indexer.embed_batch_size);

    tracing::info!(
        "Indexing {} entities from {} into {}",
        catalog.len(),
        documents_dir.display(),
        store_dir.display()
    );
    let report = indexer
        .run(&catalog, &documents_dir, &store_dir)
        .await
        .context("Indexing failed")?;

    for (entity, chunks) in &report.indexed {
        println!("{:<16} {:>6} chunks", entity, chunks);
    }
    for (entity, reason) in &report.skipped {
        let reason = match reason {
            SkipReason::MissingFile => "file not found".to_string(),
            SkipReason::LoadFailed(err) => format!("load failed: {}", err),
            SkipReason::NoText => "no extractable text".to_string(),
        };
        println!("{:<16} skipped ({})", entity, reason);
    }
    println!("Index ready at {} ({} chunks)", store_dir.display(), report.total_chunks);

    Ok(())
}
