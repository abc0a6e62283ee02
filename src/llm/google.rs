use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::EmbeddingProvider;
use crate::core::config::settings::EmbeddingSettings;
use crate::core::config::ApiKey;
use crate::core::errors::ApiError;

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

/// Google Generative Language embeddings (`batchEmbedContents`).
#[derive(Clone)]
pub struct GoogleEmbeddings {
    base_url: String,
    model: String,
    api_key: ApiKey,
    client: Client,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GoogleEmbeddings {
    pub fn new(settings: &EmbeddingSettings, api_key: ApiKey) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings
                .model
                .trim_start_matches("models/")
                .to_string(),
            api_key,
            client,
        })
    }

    async fn batch_embed(&self, inputs: &[String], task_type: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, self.model
        );
        let model_ref = format!("models/{}", self.model);

        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": model_ref,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": task_type,
                })
            })
            .collect();

        let res = self.client.post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(ApiError::upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Google embeddings error ({}): {}",
                status, text
            )));
        }

        let payload: BatchEmbedResponse = res.json().await.map_err(ApiError::upstream)?;
        if payload.embeddings.len() != inputs.len() {
            return Err(ApiError::Upstream(format!(
                "Google embeddings returned {} vectors for {} inputs",
                payload.embeddings.len(),
                inputs.len()
            )));
        }

        Ok(payload.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GoogleEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.batch_embed(inputs, TASK_DOCUMENT).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.batch_embed(&[query.to_string()], TASK_QUERY).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::Upstream("Google embeddings returned no vector".to_string()))
    }
}
