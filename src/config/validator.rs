use crate::config::{Config, SCHEMA_VERSION};
use crate::embedding::LocalEmbedder;
use crate::error::{HyqaError, Result, ValidationError};
use crate::models::{Model, ModelKind};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_paths(config, &mut errors);
        Self::validate_models(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HyqaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_paths(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked when the resources are loaded
        let paths = [
            ("paths.schema_metadata", &config.paths.schema_metadata),
            ("paths.database", &config.paths.database),
            ("paths.chunks", &config.paths.chunks),
            ("paths.articles", &config.paths.articles),
        ];

        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::new(key, "Path cannot be empty"));
            }
        }
    }

    fn validate_models(config: &Config, errors: &mut Vec<ValidationError>) {
        let roles = [
            ("models.sql_assistant", &config.models.sql_assistant, ModelKind::Chat),
            ("models.text_assistant", &config.models.text_assistant, ModelKind::Chat),
            (
                "models.answer_generator",
                &config.models.answer_generator,
                ModelKind::Chat,
            ),
            ("models.embeddings", &config.models.embeddings, ModelKind::Embedding),
        ];

        for (key, name, expected) in roles {
            match Model::resolve(name) {
                Ok(model) if model.kind() != expected => {
                    errors.push(ValidationError::new(
                        key,
                        format!("Model '{}' is a {:?} model, expected {:?}", name, model.kind(), expected),
                    ));
                }
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::new(key, e.to_string())),
            }
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let provider = &config.llm.provider;
        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        // The key itself is read when the client is built
        if config.llm.requires_api_key() && config.llm.api_key_env.is_empty() {
            errors.push(ValidationError::new(
                "llm.api_key_env",
                "API key environment variable name cannot be empty",
            ));
        }

        if config.llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let backend = &config.embedding.backend;
        match backend.as_str() {
            "remote" => {}
            "local" => {
                if !LocalEmbedder::supports(&config.models.embeddings) {
                    errors.push(ValidationError::new(
                        "models.embeddings",
                        format!(
                            "Local backend cannot run '{}', supported: {:?}",
                            config.models.embeddings,
                            LocalEmbedder::SUPPORTED
                        ),
                    ));
                }
            }
            _ => errors.push(ValidationError::new(
                "embedding.backend",
                format!("Backend must be 'remote' or 'local', got '{}'", backend),
            )),
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        let versions = config.retrieval.expansion_versions;
        if !(1..=10).contains(&versions) {
            errors.push(ValidationError::new(
                "retrieval.expansion_versions",
                format!("Expansion versions must be between 1 and 10, got {}", versions),
            ));
        }
    }
}
