use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{RagChatError, RagChatResult};
use crate::llm::provider::CompletionProvider;
use crate::llm::types::{CallConfig, ChatMessage};

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: SecretString) -> Self {
        Self {
            id,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> String {
        if self.api_base.ends_with("/chat/completions") {
            self.api_base.clone()
        } else {
            format!("{}/chat/completions", self.api_base)
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        cfg: &CallConfig,
    ) -> RagChatResult<String> {
        let body = serde_json::json!({
            "model": cfg.model,
            "messages": &messages,
            "temperature": cfg.temperature,
        });

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            messages = messages.len(),
            "sending LLM request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(RagChatError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        let json: serde_json::Value = response.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                RagChatError::LlmProvider("response has no choices[0].message.content".into())
            })?
            .to_string();

        tracing::info!(
            provider = %self.id,
            content_len = content.len(),
            finish_reason = json["choices"][0]["finish_reason"].as_str().unwrap_or("unknown"),
            "LLM response received"
        );

        Ok(content)
    }
}
