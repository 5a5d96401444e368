use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PromptsConfig;
use crate::errors::{RagChatError, RagChatResult};
use crate::llm::provider::CompletionProvider;
use crate::llm::types::{CallConfig, ChatMessage};
use crate::rag::index::Chunk;

const STUFF_SYSTEM_PROMPT: &str = "\
Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{context}";

const MAP_PROMPT: &str = "\
Use the following portion of a long document to see if any of the text is relevant \
to answer the question.
Return any relevant text verbatim.
{context}
Question: {question}
Relevant text, if any:";

const REDUCE_PROMPT: &str = "\
Given the following extracted parts of a long document and a question, create a final answer.
If you don't know the answer, just say that you don't know. Don't try to make up an answer.

QUESTION: {question}
=========
{summaries}
=========
FINAL ANSWER:";

/// How retrieved chunks are turned into completion calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStrategy {
    /// All chunks concatenated into a single prompt.
    Stuff,
    /// One extraction call per chunk, then one call combining the extracts.
    MapReduce,
}

impl FromStr for SynthesisStrategy {
    type Err = RagChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stuff" => Ok(Self::Stuff),
            "map_reduce" | "map-reduce" => Ok(Self::MapReduce),
            other => Err(RagChatError::Config(format!(
                "unknown synthesis strategy '{other}' (expected \"stuff\" or \"map_reduce\")"
            ))),
        }
    }
}

impl fmt::Display for SynthesisStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stuff => f.write_str("stuff"),
            Self::MapReduce => f.write_str("map_reduce"),
        }
    }
}

#[derive(Debug, Clone)]
struct Prompts {
    stuff_system: String,
    map: String,
    reduce: String,
}

impl Prompts {
    fn resolve(overrides: &PromptsConfig) -> Self {
        Self {
            stuff_system: overrides
                .stuff_system
                .clone()
                .unwrap_or_else(|| STUFF_SYSTEM_PROMPT.into()),
            map: overrides.map.clone().unwrap_or_else(|| MAP_PROMPT.into()),
            reduce: overrides.reduce.clone().unwrap_or_else(|| REDUCE_PROMPT.into()),
        }
    }
}

/// Single-pass `{name}` substitution; substituted values are never re-scanned.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = vars
            .iter()
            .find(|(name, _)| tail.starts_with(*name) && tail[name.len()..].starts_with('}'));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

pub struct AnswerSynthesizer {
    provider: Arc<dyn CompletionProvider>,
    call: CallConfig,
    strategy: SynthesisStrategy,
    prompts: Prompts,
}

impl AnswerSynthesizer {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        call: CallConfig,
        strategy: SynthesisStrategy,
        overrides: &PromptsConfig,
    ) -> Self {
        Self {
            provider,
            call,
            strategy,
            prompts: Prompts::resolve(overrides),
        }
    }

    pub fn strategy(&self) -> SynthesisStrategy {
        self.strategy
    }

    /// Answers `question` from `chunks`. Callers handle the empty case.
    pub async fn synthesize(&self, question: &str, chunks: &[Chunk]) -> RagChatResult<String> {
        tracing::info!(
            strategy = %self.strategy,
            provider = %self.provider.name(),
            chunks = chunks.len(),
            "synthesizing answer"
        );
        match self.strategy {
            SynthesisStrategy::Stuff => self.stuff(question, chunks).await,
            SynthesisStrategy::MapReduce => self.map_reduce(question, chunks).await,
        }
    }

    async fn stuff(&self, question: &str, chunks: &[Chunk]) -> RagChatResult<String> {
        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let messages = vec![
            ChatMessage::system(fill(
                &self.prompts.stuff_system,
                &[("context", context.as_str()), ("question", question)],
            )),
            ChatMessage::user(question),
        ];
        self.provider.complete(messages, &self.call).await
    }

    async fn map_reduce(&self, question: &str, chunks: &[Chunk]) -> RagChatResult<String> {
        let mut extracts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let prompt = fill(
                &self.prompts.map,
                &[("context", chunk.text.as_str()), ("question", question)],
            );
            let extract = self
                .provider
                .complete(vec![ChatMessage::user(prompt)], &self.call)
                .await?;
            extracts.push(extract);
        }

        tracing::debug!(extracts = extracts.len(), "map step complete");

        let summaries = extracts.join("\n\n");
        let prompt = fill(
            &self.prompts.reduce,
            &[("summaries", summaries.as_str()), ("question", question)],
        );
        self.provider
            .complete(vec![ChatMessage::user(prompt)], &self.call)
            .await
    }
}
