/// FastEmbed backend for corpora embedded with a local model
use super::{Embedding, EmbeddingError, EmbeddingService};
use anyhow::Context;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;

/// Local embedding generation
///
/// Query vectors must come from the same model that embedded the corpus, so
/// this backend is only useful when the offline chunking job used one of
/// [`LocalEmbedder::SUPPORTED`].
pub struct LocalEmbedder {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl LocalEmbedder {
    /// Model names this backend can load
    pub const SUPPORTED: [&'static str; 3] =
        ["all-MiniLM-L6-v2", "bge-small-en-v1.5", "bge-base-en-v1.5"];

    pub fn supports(model_name: &str) -> bool {
        Self::lookup(model_name).is_some()
    }

    fn lookup(model_name: &str) -> Option<(EmbeddingModel, usize)> {
        match model_name {
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
            "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
            "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
            _ => None,
        }
    }

    /// Load a local model
    ///
    /// Models are downloaded on first use to the FastEmbed cache.
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let (embedding_model, dimension) = Self::lookup(model_name).ok_or_else(|| {
            EmbeddingError::InitializationError(format!(
                "Unsupported model: {}. Supported: {}",
                model_name,
                Self::SUPPORTED.join(", ")
            ))
        })?;

        tracing::info!("Initializing local embedding model: {} ({}D)", model_name, dimension);

        let model = Self::load(embedding_model, model_name)
            .map_err(|e| EmbeddingError::InitializationError(format!("{:#}", e)))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    fn load(embedding_model: EmbeddingModel, model_name: &str) -> anyhow::Result<TextEmbedding> {
        let init_options = InitOptions::new(embedding_model).with_show_download_progress(true);

        TextEmbedding::try_new(init_options)
            .with_context(|| format!("Failed to load FastEmbed model {}", model_name))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl EmbeddingService for LocalEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let vector = embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))?;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        // Local inference is not billed
        Ok(Embedding {
            vector,
            input_tokens: 0,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_names() {
        assert!(LocalEmbedder::supports("all-MiniLM-L6-v2"));
        assert!(LocalEmbedder::supports("bge-base-en-v1.5"));
        assert!(!LocalEmbedder::supports("text-embedding-3-small"));
    }

    #[test]
    fn test_unsupported_model_fails_fast() {
        assert!(matches!(
            LocalEmbedder::new("text-embedding-3-small"),
            Err(EmbeddingError::InitializationError(_))
        ));
    }

    #[test]
    #[ignore] // Requires model download (~90MB) - run with: cargo test -- --ignored
    fn test_single_embedding() {
        let provider = LocalEmbedder::new("all-MiniLM-L6-v2").unwrap();
        let embedding = provider.embed("Which suppliers ship tofu?").unwrap();

        assert_eq!(embedding.vector.len(), 384);
        assert_eq!(embedding.input_tokens, 0);
    }

    #[test]
    #[ignore] // Requires model download (~90MB) - run with: cargo test -- --ignored
    fn test_empty_text() {
        let provider = LocalEmbedder::new("all-MiniLM-L6-v2").unwrap();
        assert!(provider.embed("").is_err());
    }
}
