//! Query embedding
//!
//! Architecture:
//! - `EmbeddingService` trait: text in, fixed-length vector out
//! - `OpenAiClient` (in `llm`) for remote embedding endpoints
//! - `LocalEmbedder` for corpora embedded with a local FastEmbed model
mod local;

pub use local::LocalEmbedder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Embedding vector plus the input tokens the service billed
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub input_tokens: u64,
}

/// Trait for embedding backends
pub trait EmbeddingService: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}
