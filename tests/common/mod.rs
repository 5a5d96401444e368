#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ragchat::config::PromptsConfig;
use ragchat::errors::{RagChatError, RagChatResult};
use ragchat::llm::provider::CompletionProvider;
use ragchat::llm::types::{CallConfig, ChatMessage};
use ragchat::rag::embedder::EmbeddingProvider;
use ragchat::rag::index::{Chunk, VectorIndex};
use ragchat::rag::pipeline::AnswerPipeline;
use ragchat::rag::synthesizer::{AnswerSynthesizer, SynthesisStrategy};

pub struct StubEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl StubEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, _text: &str) -> RagChatResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagChatError::Embedding("503 Service Unavailable".into()));
        }
        Ok(vec![0.25, 0.5, 0.75])
    }

    fn model_name(&self) -> &str {
        "stub-embed"
    }
}

pub struct StubIndex {
    texts: Vec<String>,
    pub requested_k: Mutex<Vec<usize>>,
}

impl StubIndex {
    pub fn with_texts(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            requested_k: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn search(&self, _vector: &[f32], top_k: usize) -> RagChatResult<Vec<Chunk>> {
        self.requested_k.lock().unwrap().push(top_k);
        Ok(self
            .texts
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("chunk-{i}"),
                text: text.clone(),
                score: 1.0 - i as f32 * 0.1,
                metadata: serde_json::Map::new(),
            })
            .collect())
    }
}

pub struct StubCompletion {
    reply: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubCompletion {
    fn name(&self) -> &str {
        "stub-llm"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _cfg: &CallConfig,
    ) -> RagChatResult<String> {
        self.calls.lock().unwrap().push(messages);
        self.reply
            .clone()
            .ok_or_else(|| RagChatError::LlmProvider("500 Internal Server Error".into()))
    }
}

pub fn pipeline(
    embedder: Arc<StubEmbedder>,
    index: Arc<StubIndex>,
    llm: Arc<StubCompletion>,
    strategy: SynthesisStrategy,
) -> AnswerPipeline {
    let synthesizer = AnswerSynthesizer::new(
        llm,
        CallConfig {
            model: "stub-model".into(),
            temperature: 0.0,
        },
        strategy,
        &PromptsConfig::default(),
    );
    AnswerPipeline::new(embedder, index, synthesizer, 3)
}
