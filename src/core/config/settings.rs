use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ApiError;

/// Typed view over the merged YAML config.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub indexer: IndexerSettings,
    /// Entity label -> PDF file name.
    pub entities: BTreeMap<String, String>,
    pub embeddings: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSettings {
    pub documents_dir: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Settings {
    pub fn from_value(config: Value) -> Result<Self, ApiError> {
        serde_json::from_value(config)
            .map_err(|err| ApiError::BadRequest(format!("Invalid config: {}", err)))
    }
}
