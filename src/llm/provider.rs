use async_trait::async_trait;

use crate::errors::RagChatResult;
use crate::llm::types::{CallConfig, ChatMessage};

/// Hosted completion API. Implementations return the assistant text verbatim.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        cfg: &CallConfig,
    ) -> RagChatResult<String>;
}
