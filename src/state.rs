use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, Secrets, Settings};
use crate::llm::{EmbeddingProvider, GoogleEmbeddings, OpenAiChat};
use crate::rag::sqlite::META_EMBEDDING_MODEL;
use crate::rag::{ContextEngine, SqliteVectorStore, VectorStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    /// `None` until the AI components are loaded; requests get 503 meanwhile.
    pub engine: Option<ContextEngine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads the store and both providers. Any failure aborts startup.
    pub async fn initialize(
        paths: &AppPaths,
        settings: Settings,
        secrets: &Secrets,
    ) -> anyhow::Result<Arc<Self>> {
        let embeddings_key = secrets.require_embeddings()?;
        let generation_key = secrets.require_generation()?;
        tracing::info!("API keys present");

        let embeddings = GoogleEmbeddings::new(&settings.embeddings, embeddings_key)?;

        let store_dir = paths.resolve(&settings.store.directory);
        tracing::info!("Loading vector store from {}", store_dir.display());
        let store = SqliteVectorStore::open_existing(&store_dir)
            .await
            .with_context(|| format!("Failed to open vector store {}", store_dir.display()))?;

        let chunk_count = store.count(None).await?;
        if chunk_count == 0 {
            tracing::warn!("Vector store {} is empty", store_dir.display());
        }
        match store.get_meta(META_EMBEDDING_MODEL).await? {
            Some(model) if model != embeddings.model() => tracing::warn!(
                "Store was built with embedding model '{}' but '{}' is configured",
                model,
                embeddings.model()
            ),
            _ => {}
        }
        tracing::info!("Vector store loaded: {} chunks", chunk_count);

        let generator = OpenAiChat::new(&settings.generation, generation_key)?;
        tracing::info!("Generation model: {}", settings.generation.model);

        let engine = ContextEngine::new(Arc::new(store), Arc::new(embeddings), Arc::new(generator))
            .with_top_k(settings.retrieval.top_k);
        tracing::info!("Retrieving up to {} chunks per question", engine.top_k());

        Ok(Arc::new(Self::with_engine(settings, Some(engine))))
    }

    pub fn with_engine(settings: Settings, engine: Option<ContextEngine>) -> Self {
        AppState {
            settings,
            engine,
            started_at: Utc::now(),
        }
    }

    pub fn engine(&self) -> Option<&ContextEngine> {
        self.engine.as_ref()
    }
}
