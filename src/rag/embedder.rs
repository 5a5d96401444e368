use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::errors::{RagChatError, RagChatResult};

/// Turns a query into the vector the index was populated with.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> RagChatResult<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Cohere `/embed` client.
pub struct CohereEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
}

impl CohereEmbedder {
    pub fn new(cfg: &EmbeddingConfig, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<&'a str>,
    model: &'a str,
    input_type: &'a str,
    truncate: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for CohereEmbedder {
    async fn embed(&self, text: &str) -> RagChatResult<Vec<f32>> {
        let req = EmbedRequest {
            texts: vec![text],
            model: &self.model,
            input_type: "search_query",
            truncate: "END",
        };

        let response = self
            .client
            .post(format!("{}/embed", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&req)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(RagChatError::Embedding(format!("{}: {}", status, err_body)));
        }

        let vector = response
            .json::<EmbedResponse>()
            .await?
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagChatError::Embedding("empty embedding response".into()))?;

        tracing::debug!(model = %self.model, dims = vector.len(), "query embedded");
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
