use std::sync::Arc;

use crate::errors::RagChatResult;
use crate::rag::embedder::EmbeddingProvider;
use crate::rag::index::{Chunk, VectorIndex};
use crate::rag::synthesizer::AnswerSynthesizer;
use crate::session::transcript::Transcript;

/// Returned instead of calling the LLM when the search finds nothing.
pub const NO_DOCUMENTS_ANSWER: &str =
    "Sorry, I couldn't find any relevant documents related to your question.";

/// Query → embedding → vector search → synthesis. Built once at startup and shared.
pub struct AnswerPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        synthesizer: AnswerSynthesizer,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            synthesizer,
            top_k,
        }
    }

    pub async fn retrieve(&self, query: &str) -> RagChatResult<Vec<Chunk>> {
        let vector = self.embedder.embed(query).await?;
        self.index.search(&vector, self.top_k).await
    }

    /// Answers `query` and appends the pair to `transcript`.
    ///
    /// Any provider error is returned as-is and the transcript is left untouched.
    pub async fn answer(
        &self,
        query: &str,
        transcript: &mut Transcript,
    ) -> RagChatResult<String> {
        let chunks = self.retrieve(query).await?;

        let answer = if chunks.is_empty() {
            tracing::info!(model = %self.embedder.model_name(), "no relevant documents found");
            NO_DOCUMENTS_ANSWER.to_string()
        } else {
            tracing::info!(
                chunks = chunks.len(),
                top_score = chunks[0].score,
                strategy = %self.synthesizer.strategy(),
                "retrieved context"
            );
            self.synthesizer.synthesize(query, &chunks).await?
        };

        transcript.append(query, answer.clone());
        Ok(answer)
    }
}
