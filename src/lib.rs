pub mod auth;
pub mod config;
pub mod errors;
pub mod llm;
pub mod rag;
pub mod session;
pub mod web;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialGate;
use crate::config::{require, Secrets};
use crate::errors::RagChatResult;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;
use crate::rag::embedder::CohereEmbedder;
use crate::rag::index::PineconeIndex;
use crate::rag::pipeline::AnswerPipeline;
use crate::rag::synthesizer::AnswerSynthesizer;
use crate::web::AppState;

fn http_client(timeout_secs: Option<u64>) -> RagChatResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Loads configuration, builds every collaborator once, and serves the web UI.
pub async fn run() -> RagChatResult<()> {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load_config()?;
    let strategy = cfg.resolved_strategy()?;
    let secrets = Secrets::from_env();
    if let Some(env) = &secrets.pinecone_environment {
        tracing::debug!(
            environment = %env,
            "PINECONE_ENVIRONMENT set; index host comes from the control plane"
        );
    }

    let embedder = CohereEmbedder::new(
        &cfg.embedding,
        require(secrets.cohere_api_key, "COHERE_API_KEY")?,
    )
    .with_client(http_client(cfg.embedding.timeout_secs)?);

    let index = PineconeIndex::new(
        &cfg.index,
        require(secrets.pinecone_api_key, "PINECONE_API_KEY")?,
    )
    .with_client(http_client(cfg.index.timeout_secs)?);
    if cfg.index.verify_on_startup {
        index.ensure_ready().await?;
    }

    let llm = OpenAiCompatibleProvider::new(
        "openai".into(),
        cfg.llm.api_base.clone(),
        require(secrets.openai_api_key, "OPENAI_API_KEY")?,
    )
    .with_client(http_client(cfg.llm.timeout_secs)?);

    let synthesizer = AnswerSynthesizer::new(
        Arc::new(llm),
        CallConfig {
            model: cfg.llm.model.clone(),
            temperature: cfg.llm.temperature,
        },
        strategy,
        &cfg.synthesis.prompts,
    );
    let pipeline = AnswerPipeline::new(
        Arc::new(embedder),
        Arc::new(index),
        synthesizer,
        cfg.index.top_k,
    );

    tracing::info!(
        strategy = %strategy,
        index = %cfg.index.name,
        top_k = cfg.index.top_k,
        "answer pipeline ready"
    );

    let state = AppState::new(
        CredentialGate::new(secrets.user_password),
        pipeline,
        cfg.ui.clone(),
    )
    .with_session_idle(Duration::from_secs(cfg.server.session_idle_secs));
    web::serve(state, &cfg.server.bind).await
}
