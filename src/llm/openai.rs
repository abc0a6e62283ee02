use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationProvider;
use super::types::ChatRequest;
use crate::core::config::settings::GenerationSettings;
use crate::core::config::ApiKey;
use crate::core::errors::ApiError;

/// OpenAI chat completions client used to synthesise answers.
#[derive(Clone)]
pub struct OpenAiChat {
    base_url: String,
    model: String,
    temperature: f64,
    api_key: ApiKey,
    client: Client,
}

impl OpenAiChat {
    pub fn new(settings: &GenerationSettings, api_key: ApiKey) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": self.temperature,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("OpenAI chat error ({}): {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ApiError::Upstream(
                "OpenAI chat returned an empty completion".to_string(),
            ));
        }

        Ok(content.to_string())
    }
}
