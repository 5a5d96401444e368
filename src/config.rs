use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::{RagChatError, RagChatResult};
use crate::rag::synthesizer::SynthesisStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Sessions untouched for this long are dropped along with their transcript.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".into()
}

pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

fn default_session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_cohere_base")]
    pub api_base: String,
    /// Must match the model the index was populated with.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Optional per-request timeout; unset means the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: default_cohere_base(),
            model: default_embedding_model(),
            timeout_secs: None,
        }
    }
}

fn default_cohere_base() -> String {
    "https://api.cohere.ai/v1".into()
}

fn default_embedding_model() -> String {
    "small".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    /// Metadata field holding the chunk text.
    #[serde(default = "default_text_key")]
    pub text_key: String,
    #[serde(default = "default_control_plane")]
    pub control_plane: String,
    /// Data-plane host. When absent it is resolved through the control plane.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_true")]
    pub verify_on_startup: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            text_key: default_text_key(),
            control_plane: default_control_plane(),
            host: None,
            namespace: String::new(),
            top_k: default_top_k(),
            verify_on_startup: true,
            timeout_secs: None,
        }
    }
}

fn default_index_name() -> String {
    "demo-index".into()
}

fn default_text_key() -> String {
    "text".into()
}

fn default_control_plane() -> String {
    "https://api.pinecone.io".into()
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_base")]
    pub api_base: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_base(),
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_temperature() -> f64 {
    0.7
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SynthesisConfig {
    /// No default on purpose: deployments must pin `stuff` or `map_reduce`.
    pub strategy: Option<SynthesisStrategy>,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// Prompt overrides. `{context}`, `{question}` and `{summaries}` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    pub stuff_system: Option<String>,
    pub map: Option<String>,
    pub reduce: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_user_icon")]
    pub user_icon_url: String,
    #[serde(default = "default_assistant_icon")]
    pub assistant_icon_url: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            greeting: default_greeting(),
            user_icon_url: default_user_icon(),
            assistant_icon_url: default_assistant_icon(),
        }
    }
}

fn default_title() -> String {
    "AI Assistant".into()
}

fn default_greeting() -> String {
    "How can we help you today?".into()
}

fn default_user_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/2503/2503707.png".into()
}

fn default_assistant_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/7966/7966941.png".into()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> RagChatResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> RagChatResult<()> {
        if self.index.top_k == 0 {
            return Err(RagChatError::Config("index.top_k must be at least 1".into()));
        }
        if self.server.session_idle_secs == 0 {
            return Err(RagChatError::Config(
                "server.session_idle_secs must be at least 1".into(),
            ));
        }
        if self.index.name.trim().is_empty() {
            return Err(RagChatError::Config("index.name must not be empty".into()));
        }
        Ok(())
    }

    /// The pinned synthesis strategy, with `RAGCHAT_SYNTHESIS_STRATEGY` taking precedence.
    pub fn resolved_strategy(&self) -> RagChatResult<SynthesisStrategy> {
        if let Ok(raw) = std::env::var("RAGCHAT_SYNTHESIS_STRATEGY") {
            return raw.parse();
        }
        self.synthesis.strategy.ok_or_else(|| {
            RagChatError::Config(
                "synthesis.strategy is not set; pin \"stuff\" or \"map_reduce\" in config.toml \
                 or RAGCHAT_SYNTHESIS_STRATEGY"
                    .into(),
            )
        })
    }
}

/// API keys and the login password. Only ever read from the environment.
pub struct Secrets {
    pub cohere_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub pinecone_api_key: Option<SecretString>,
    pub pinecone_environment: Option<String>,
    pub user_password: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let secret = |name: &str| std::env::var(name).ok().map(SecretString::new);
        Self {
            cohere_api_key: secret("COHERE_API_KEY"),
            openai_api_key: secret("OPENAI_API_KEY"),
            pinecone_api_key: secret("PINECONE_API_KEY"),
            pinecone_environment: std::env::var("PINECONE_ENVIRONMENT").ok(),
            user_password: secret("USER_PASSWORD"),
        }
    }
}

/// Takes a required key out of `slot`, failing with the variable name.
pub fn require(slot: Option<SecretString>, var: &str) -> RagChatResult<SecretString> {
    slot.ok_or_else(|| RagChatError::Config(format!("{var} is not set")))
}

fn resolve_config_path() -> RagChatResult<PathBuf> {
    if let Ok(explicit) = std::env::var("RAGCHAT_CONFIG") {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found via RAGCHAT_CONFIG");
            return Ok(candidate);
        }
        return Err(RagChatError::Config(format!(
            "RAGCHAT_CONFIG points to {}, which does not exist",
            candidate.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("ragchat").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config directory");
            return Ok(candidate);
        }
    }

    Err(RagChatError::Config(
        "config.toml not found via RAGCHAT_CONFIG, next to executable, in working directory, \
         or in the user config directory"
            .into(),
    ))
}

pub fn load_config() -> RagChatResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config = AppConfig::from_toml_str(&content)?;
    config.validate()?;
    tracing::info!(
        path = %path.display(),
        index = %config.index.name,
        model = %config.llm.model,
        "config loaded"
    );
    Ok(config)
}
