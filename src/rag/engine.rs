//! Query flow: filtered retrieval followed by answer synthesis.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::normalize_label;
use super::context_builder::{build_synthesis_prompt, join_context, no_context_message};
use super::store::VectorStore;
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, EmbeddingProvider, GenerationProvider};

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Clone)]
pub struct ContextEngine {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    top_k: usize,
}

impl ContextEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            store,
            embeddings,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answers `question` using only chunks indexed under `entity`.
    ///
    /// Returns the fixed "no information" message without calling the
    /// generator when the entity has no matching chunks.
    pub async fn extract_context(&self, question: &str, entity: &str) -> Result<String, ApiError> {
        let entity = normalize_label(entity);
        if entity.is_empty() {
            return Err(ApiError::BadRequest(
                "Error: El campo 'entidad' no puede estar vacío.".to_string(),
            ));
        }

        tracing::info!("Searching context for entity '{}'", entity);
        let query_embedding = self.embeddings.embed_query(question).await?;
        let results = self
            .store
            .search(&query_embedding, self.top_k, Some(&entity))
            .await?;

        if results.is_empty() {
            tracing::info!("No indexed context for entity '{}'", entity);
            return Ok(no_context_message(&entity));
        }

        let raw_context = join_context(&results);
        let prompt = build_synthesis_prompt(&entity, question, &raw_context);

        tracing::info!(
            "Synthesizing answer with {} ({} chunks, entity '{}')",
            self.generator.model(),
            results.len(),
            entity
        );
        let answer = self.generator.generate(ChatRequest::from_prompt(prompt)).await?;
        tracing::debug!("Answer generated for entity '{}'", entity);

        Ok(answer)
    }

    /// Chunk counts per indexed entity.
    pub async fn indexed_entities(&self) -> Result<BTreeMap<String, usize>, ApiError> {
        self.store.entities().await
    }
}
