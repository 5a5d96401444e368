use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::IndexConfig;
use crate::errors::{RagChatError, RagChatResult};

const PINECONE_API_VERSION: &str = "2024-07";

/// A previously ingested piece of document text returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub score: f32,
    /// Remaining metadata fields, text field excluded.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Managed nearest-neighbour search over embedded chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`k` chunks ordered by the service's similarity score.
    async fn search(&self, vector: &[f32], top_k: usize) -> RagChatResult<Vec<Chunk>>;
}

pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: SecretString,
    name: String,
    text_key: String,
    namespace: String,
    control_plane: String,
    host: OnceCell<String>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

fn with_scheme(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

impl PineconeIndex {
    pub fn new(cfg: &IndexConfig, api_key: SecretString) -> Self {
        let host = match &cfg.host {
            Some(h) => OnceCell::new_with(Some(with_scheme(h))),
            None => OnceCell::new(),
        };
        Self {
            client: reqwest::Client::new(),
            api_key,
            name: cfg.name.clone(),
            text_key: cfg.text_key.clone(),
            namespace: cfg.namespace.clone(),
            control_plane: cfg.control_plane.trim_end_matches('/').to_string(),
            host,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Confirms the index exists and caches its data-plane host.
    pub async fn ensure_ready(&self) -> RagChatResult<()> {
        let host = self.describe().await?;
        tracing::info!(index = %self.name, host = %host, "vector index ready");
        Ok(())
    }

    async fn describe(&self) -> RagChatResult<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(format!("{}/indexes/{}", self.control_plane, self.name))
                    .header("Api-Key", self.api_key.expose_secret())
                    .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
                    .send()
                    .await?;

                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(RagChatError::Config(format!(
                        "Pinecone index '{}' does not exist. Please run the indexing script first.",
                        self.name
                    )));
                }
                if !response.status().is_success() {
                    let status = response.status();
                    let err_body = response.text().await.unwrap_or_default();
                    return Err(RagChatError::VectorIndex(format!("{}: {}", status, err_body)));
                }

                let description: IndexDescription = response.json().await?;
                Ok::<_, RagChatError>(with_scheme(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }

    fn chunk_from_match(&self, m: QueryMatch) -> Option<Chunk> {
        let mut metadata = m.metadata.unwrap_or_default();
        match metadata.remove(&self.text_key) {
            Some(serde_json::Value::String(text)) => Some(Chunk {
                id: m.id,
                text,
                score: m.score,
                metadata,
            }),
            _ => {
                tracing::warn!(
                    id = %m.id,
                    text_key = %self.text_key,
                    "match has no text field; skipping"
                );
                None
            }
        }
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn search(&self, vector: &[f32], top_k: usize) -> RagChatResult<Vec<Chunk>> {
        let host = self.describe().await?;
        let req = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
        };

        let response = self
            .client
            .post(format!("{host}/query"))
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&req)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(RagChatError::VectorIndex(format!("{}: {}", status, err_body)));
        }

        let parsed: QueryResponse = response.json().await?;
        let chunks: Vec<Chunk> = parsed
            .matches
            .into_iter()
            .filter_map(|m| self.chunk_from_match(m))
            .collect();

        tracing::debug!(index = %self.name, top_k, chunks = chunks.len(), "similarity search done");
        Ok(chunks)
    }
}
