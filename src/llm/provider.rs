use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// model identifier recorded alongside the vectors it produced
    fn model(&self) -> &str;

    /// embed passages destined for the store, one vector per input, same order
    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    /// embed a search query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError>;
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn model(&self) -> &str;

    /// chat completion (non-streaming)
    async fn generate(&self, request: ChatRequest) -> Result<String, ApiError>;
}
