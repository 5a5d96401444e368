use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub query: String,
    pub answer: String,
    pub asked_at: chrono::DateTime<chrono::Utc>,
}

/// Append-only, in-memory log of one session's question/answer pairs.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            query: query.into(),
            answer: answer.into(),
            asked_at: chrono::Utc::now(),
        });
        tracing::debug!(entries = self.entries.len(), "transcript entry appended");
    }

    /// Entries in submission order.
    pub fn all(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
