//! SQLite-backed vector store.
//!
//! One `chunks.db` file inside the store directory. Metadata lives in
//! SQLite, similarity is brute-force cosine over the filtered rows.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, StoredChunk, VectorStore};
use crate::core::errors::ApiError;

pub const DB_FILE_NAME: &str = "chunks.db";
pub const META_EMBEDDING_MODEL: &str = "embedding_model";
pub const META_BUILT_AT: &str = "built_at";

pub struct SqliteVectorStore {
    pool: SqlitePool,
    dir: PathBuf,
}

impl SqliteVectorStore {
    /// Opens a store built earlier by the indexer. The directory must exist.
    pub async fn open_existing(dir: &Path) -> Result<Self, ApiError> {
        if !dir.is_dir() {
            return Err(ApiError::NotFound(format!(
                "vector store directory '{}' does not exist; run the indexer first",
                dir.display()
            )));
        }
        Self::connect(dir).await
    }

    /// Removes any previous store in `dir` and creates an empty one.
    pub async fn create_fresh(dir: &Path) -> Result<Self, ApiError> {
        if dir.exists() {
            tracing::info!("Removing previous vector store at {}", dir.display());
            tokio::fs::remove_dir_all(dir)
                .await
                .map_err(ApiError::internal)?;
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(ApiError::internal)?;
        Self::connect(dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Closes the pool so the directory can be removed or reopened.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn connect(dir: &Path) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(dir.join(DB_FILE_NAME))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self {
            pool,
            dir: dir.to_path_buf(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                entity TEXT NOT NULL,
                source_file TEXT NOT NULL DEFAULT '',
                page INTEGER NOT NULL DEFAULT 0,
                chunk_index INTEGER NOT NULL DEFAULT 0,
                metadata TEXT DEFAULT '{}',
                embedding BLOB
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_entity ON chunks(entity)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();
        let page: i64 = row.get("page");
        let chunk_index: i64 = row.get("chunk_index");

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            entity: row.get("entity"),
            source_file: row.get("source_file"),
            page: page.max(0) as u32,
            chunk_index: chunk_index.max(0) as usize,
            metadata,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str = match &chunk.metadata {
                Some(metadata) => serde_json::to_string(metadata).map_err(ApiError::internal)?,
                None => "{}".to_string(),
            };

            sqlx::query(
                "INSERT OR REPLACE INTO chunks (chunk_id, content, entity, source_file, page, chunk_index, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.entity)
            .bind(&chunk.source_file)
            .bind(i64::from(chunk.page))
            .bind(chunk.chunk_index as i64)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        entity: Option<&str>,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = if let Some(entity) = entity {
            sqlx::query(
                "SELECT chunk_id, content, entity, source_file, page, chunk_index, metadata, embedding
                 FROM chunks
                 WHERE entity = ?1",
            )
            .bind(entity)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query(
                "SELECT chunk_id, content, entity, source_file, page, chunk_index, metadata, embedding
                 FROM chunks",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        };

        let mut scored: Vec<ChunkSearchResult> = Vec::with_capacity(rows.len());
        for row in &rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            if embedding_bytes.is_empty() {
                continue;
            }
            let stored_emb = Self::deserialize_embedding(&embedding_bytes);
            // A different width means the store was built with another embedding model.
            if stored_emb.len() != query_embedding.len() {
                return Err(ApiError::Internal(format!(
                    "query embedding has {} dimensions but stored chunks have {}; rebuild the index",
                    query_embedding.len(),
                    stored_emb.len()
                )));
            }
            let score = Self::cosine_similarity(query_embedding, &stored_emb);

            scored.push(ChunkSearchResult {
                chunk: Self::row_to_chunk(row),
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self, entity: Option<&str>) -> Result<usize, ApiError> {
        let count: i64 = if let Some(entity) = entity {
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE entity = ?1")
                .bind(entity)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?
        };

        Ok(count as usize)
    }

    async fn entities(&self) -> Result<BTreeMap<String, usize>, ApiError> {
        let rows = sqlx::query("SELECT entity, COUNT(*) AS total FROM chunks GROUP BY entity")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| {
                let total: i64 = row.get("total");
                (row.get::<String, _>("entity"), total as usize)
            })
            .collect())
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}
