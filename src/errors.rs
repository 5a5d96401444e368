use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type RagChatResult<T> = Result<T, RagChatError>;
