pub mod embedder;
pub mod index;
pub mod pipeline;
pub mod synthesizer;
