//! VectorStore trait: storage interface for embedded chunks.
//!
//! The indexer writes through it, the query service reads through it.
//! The shipped implementation is `SqliteVectorStore` in the `sqlite` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored chunk with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Entity label used as the retrieval filter.
    pub entity: String,
    /// File the chunk was extracted from.
    pub source_file: String,
    /// 1-based page number inside the source file.
    pub page: u32,
    /// Position of the chunk within its source file.
    pub chunk_index: usize,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert multiple chunks in one transaction.
    async fn insert_batch(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Nearest chunks to `query_embedding`, restricted to `entity` when given.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        entity: Option<&str>,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    /// Chunk count, optionally for a single entity.
    async fn count(&self, entity: Option<&str>) -> Result<usize, ApiError>;

    /// Chunk count per entity label.
    async fn entities(&self) -> Result<BTreeMap<String, usize>, ApiError>;

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError>;

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError>;
}
