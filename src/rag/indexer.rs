//! Offline index build.
//!
//! Every run starts from an empty store directory: load each catalog
//! document, split it, tag the chunks with their entity, embed and persist.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::catalog::{CatalogEntry, EntityCatalog};
use super::loader::DocumentLoader;
use super::splitter::{RecursiveSplitter, TextChunk};
use super::sqlite::{SqliteVectorStore, META_BUILT_AT, META_EMBEDDING_MODEL};
use super::store::{StoredChunk, VectorStore};
use crate::core::errors::ApiError;
use crate::llm::EmbeddingProvider;

pub const DEFAULT_EMBED_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingFile,
    LoadFailed(String),
    NoText,
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Chunks written per entity label.
    pub indexed: BTreeMap<String, usize>,
    /// Entities that contributed nothing, with the reason.
    pub skipped: BTreeMap<String, SkipReason>,
    pub total_chunks: usize,
}

pub struct Indexer {
    loader: Arc<dyn DocumentLoader>,
    embeddings: Arc<dyn EmbeddingProvider>,
    splitter: RecursiveSplitter,
    batch_size: usize,
}

impl Indexer {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embeddings: Arc<dyn EmbeddingProvider>,
        splitter: RecursiveSplitter,
    ) -> Self {
        Self {
            loader,
            embeddings,
            splitter,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Rebuilds the store in `store_dir` from the catalog documents.
    ///
    /// Fails when no document produced any chunk; the previous store is
    /// already gone at that point.
    pub async fn run(
        &self,
        catalog: &EntityCatalog,
        documents_dir: &Path,
        store_dir: &Path,
    ) -> Result<IndexReport, ApiError> {
        let store = SqliteVectorStore::create_fresh(store_dir).await?;
        let result = self.populate(&store, catalog, documents_dir).await;
        store.close().await;
        result
    }

    async fn populate(
        &self,
        store: &SqliteVectorStore,
        catalog: &EntityCatalog,
        documents_dir: &Path,
    ) -> Result<IndexReport, ApiError> {
        tracing::info!(
            "Processing {} documents (chunk size {}, overlap {})",
            catalog.len(),
            self.splitter.chunk_size(),
            self.splitter.chunk_overlap()
        );

        let mut report = IndexReport::default();
        let mut pending: Vec<StoredChunk> = Vec::new();

        for entry in catalog.entries() {
            match self.collect_entry(entry, documents_dir).await {
                Ok(chunks) => {
                    tracing::info!(
                        "Split '{}' into {} chunks (entity '{}')",
                        entry.file_name,
                        chunks.len(),
                        entry.label
                    );
                    report.indexed.insert(entry.label.clone(), chunks.len());
                    pending.extend(chunks);
                }
                Err(reason) => {
                    report.skipped.insert(entry.label.clone(), reason);
                }
            }
        }

        if pending.is_empty() {
            return Err(ApiError::Internal(
                "no document was processed; the index is empty".to_string(),
            ));
        }

        tracing::info!(
            "Embedding {} chunks with {}",
            pending.len(),
            self.embeddings.model()
        );
        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
            let vectors = self.embeddings.embed_documents(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(ApiError::Upstream(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            store
                .insert_batch(batch.iter().cloned().zip(vectors).collect())
                .await?;
            report.total_chunks += batch.len();
            tracing::debug!("Stored {}/{} chunks", report.total_chunks, pending.len());
        }

        store
            .set_meta(META_EMBEDDING_MODEL, self.embeddings.model())
            .await?;
        store
            .set_meta(META_BUILT_AT, &Utc::now().to_rfc3339())
            .await?;

        tracing::info!(
            "Index built in {}: {} chunks",
            store.dir().display(),
            report.total_chunks
        );
        Ok(report)
    }

    async fn collect_entry(
        &self,
        entry: &CatalogEntry,
        documents_dir: &Path,
    ) -> Result<Vec<StoredChunk>, SkipReason> {
        let path = entry.path_in(documents_dir);
        if !path.is_file() {
            tracing::warn!(
                "File '{}' for entity '{}' not found, skipping",
                path.display(),
                entry.label
            );
            return Err(SkipReason::MissingFile);
        }

        let pages = match self.loader.load(&path).await {
            Ok(pages) => pages,
            Err(err) => {
                tracing::error!("Failed to load '{}': {}; skipping", path.display(), err);
                return Err(SkipReason::LoadFailed(err.to_string()));
            }
        };
        tracing::info!("Loaded '{}': {} pages", entry.file_name, pages.len());

        let chunks = self.splitter.split_pages(&pages);
        if chunks.is_empty() {
            tracing::warn!("'{}' contains no extractable text, skipping", path.display());
            return Err(SkipReason::NoText);
        }

        Ok(chunks
            .into_iter()
            .map(|chunk| tag_chunk(entry, chunk))
            .collect())
    }
}

fn tag_chunk(entry: &CatalogEntry, chunk: TextChunk) -> StoredChunk {
    StoredChunk {
        chunk_id: chunk_id(entry, &chunk),
        entity: entry.label.clone(),
        source_file: entry.file_name.clone(),
        page: chunk.page,
        chunk_index: chunk.chunk_index,
        metadata: Some(json!({
            "fuente": entry.label,
            "archivo_origen": entry.file_name,
            "page": chunk.page,
        })),
        content: chunk.text,
    }
}

fn chunk_id(entry: &CatalogEntry, chunk: &TextChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.label.as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.file_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk.page.to_le_bytes());
    hasher.update((chunk.chunk_index as u64).to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    hex::encode(hasher.finalize())
}
