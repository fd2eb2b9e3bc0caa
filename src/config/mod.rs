//! Configuration management for hyqa
//!
//! Loading, environment overrides, profiles and path resolution. Every
//! configuration problem is fatal: the assistant never starts answering
//! questions with a configuration it cannot use.

use crate::error::{HyqaError, Result};
use crate::models::Model;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Current configuration schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub paths: PathsConfig,
    pub models: ModelsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub sql: SqlConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Locations of the prepared dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON document describing every table and view
    pub schema_metadata: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Article chunks with embeddings (`.json` or `.json.zst`)
    pub chunks: PathBuf,
    /// Full raw articles (`.json` or `.json.zst`)
    pub articles: PathBuf,
}

/// Model identifier per pipeline role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub sql_assistant: String,
    pub text_assistant: String,
    pub answer_generator: String,
    pub embeddings: String,
}

/// Completion service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Overrides the provider's default API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// API base URL, falling back to the provider default
    pub fn endpoint(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }

        match self.provider.as_str() {
            "ollama" => "http://localhost:11434/v1".to_string(),
            _ => "https://api.openai.com/v1".to_string(),
        }
    }

    /// Whether the provider needs a bearer key
    pub fn requires_api_key(&self) -> bool {
        self.provider == "openai"
    }
}

/// Query embedding backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "remote" (embedding endpoint of the LLM provider) or "local" (FastEmbed)
    pub backend: String,
}

/// Text retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Hits kept per channel
    pub top_k: usize,
    /// Paraphrases requested from the query expansion call
    pub expansion_versions: usize,
}

/// SQL decomposition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Drop generated statements that are not a single SELECT/WITH query
    pub enforce_read_only: bool,
}

/// Debug trace output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub sql: bool,
    #[serde(default)]
    pub text: bool,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_assistant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_generator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_sql: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_text: Option<bool>,
}

/// Model table entries resolved for each role
#[derive(Debug, Clone)]
pub struct ResolvedModels {
    pub sql_assistant: Model,
    pub text_assistant: Model,
    pub answer_generator: Model,
    pub embeddings: Model,
}

impl Config {
    /// Load configuration from a file
    ///
    /// Relative dataset paths are resolved against the directory holding
    /// the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_inner(path, None)
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        Self::load_inner(path, Some(profile))
    }

    fn load_inner(path: &Path, profile: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(HyqaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HyqaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        if let Some(profile) = profile {
            config.apply_profile(profile)?;
        }

        // Environment wins over file and profile
        config.apply_env_overrides();

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base_dir)?;

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HyqaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| HyqaError::InvalidConfigValue {
                path: format!("profiles.{}", profile),
                message: "Profile is not defined".to_string(),
            })?;

        if let Some(model) = overrides.sql_assistant {
            self.models.sql_assistant = model;
        }
        if let Some(model) = overrides.answer_generator {
            self.models.answer_generator = model;
        }
        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }
        if let Some(sql) = overrides.debug_sql {
            self.debug.sql = sql;
        }
        if let Some(text) = overrides.debug_text {
            self.debug.text = text;
        }

        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: HYQA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("HYQA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LLM__PROVIDER" => self.llm.provider = value.to_string(),
            "LLM__BASE_URL" => self.llm.base_url = Some(value.to_string()),
            "LLM__API_KEY_ENV" => self.llm.api_key_env = value.to_string(),
            "MODELS__SQL_ASSISTANT" => self.models.sql_assistant = value.to_string(),
            "MODELS__TEXT_ASSISTANT" => self.models.text_assistant = value.to_string(),
            "MODELS__ANSWER_GENERATOR" => self.models.answer_generator = value.to_string(),
            "MODELS__EMBEDDINGS" => self.models.embeddings = value.to_string(),
            "EMBEDDING__BACKEND" => self.embedding.backend = value.to_string(),
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_env(path, value)?,
            "SQL__ENFORCE_READ_ONLY" => self.sql.enforce_read_only = parse_env(path, value)?,
            "DEBUG__SQL" => self.debug.sql = parse_env(path, value)?,
            "DEBUG__TEXT" => self.debug.text = parse_env(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Expand `~/` and anchor relative dataset paths at `base_dir`
    pub fn resolve_paths(&mut self, base_dir: &Path) -> Result<()> {
        let paths = &mut self.paths;
        for path in [
            &mut paths.schema_metadata,
            &mut paths.database,
            &mut paths.chunks,
            &mut paths.articles,
        ] {
            let expanded = expand_path(path)?;
            *path = if expanded.is_relative() && !expanded.as_os_str().is_empty() {
                base_dir.join(expanded)
            } else {
                expanded
            };
        }
        Ok(())
    }

    /// Resolve every configured model through the model table
    pub fn resolve_models(&self) -> Result<ResolvedModels> {
        Ok(ResolvedModels {
            sql_assistant: Model::resolve(&self.models.sql_assistant)?,
            text_assistant: Model::resolve(&self.models.text_assistant)?,
            answer_generator: Model::resolve(&self.models.answer_generator)?,
            embeddings: Model::resolve(&self.models.embeddings)?,
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HyqaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("hyqa").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| HyqaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

/// Expand a leading `~/` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| HyqaError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| HyqaError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("~/.hyqa");

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            paths: PathsConfig {
                schema_metadata: data_dir.join("northwind_schema.json"),
                database: data_dir.join("northwind.db"),
                chunks: data_dir.join("articles_chunks.json"),
                articles: data_dir.join("articles_raw.json"),
            },
            models: ModelsConfig {
                sql_assistant: "gpt-5-mini".to_string(),
                text_assistant: "gpt-5-mini".to_string(),
                answer_generator: "gpt-5-mini".to_string(),
                embeddings: "text-embedding-3-small".to_string(),
            },
            llm: LlmConfig {
                provider: "openai".to_string(),
                base_url: None,
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 120,
            },
            embedding: EmbeddingConfig {
                backend: "remote".to_string(),
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                expansion_versions: 3,
            },
            sql: SqlConfig {
                enforce_read_only: true,
            },
            debug: DebugConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.paths.database = PathBuf::from("data/shop.db");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.paths.database, temp.path().join("data/shop.db"));
        assert_eq!(loaded.retrieval.top_k, 5);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/hyqa.toml")).unwrap_err();
        assert!(matches!(err, HyqaError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_profile_overrides() {
        let mut config = Config::default();
        config.profiles.insert(
            "accurate".to_string(),
            ProfileOverrides {
                answer_generator: Some("gpt-5".to_string()),
                top_k: Some(8),
                ..Default::default()
            },
        );

        config.apply_profile("accurate").unwrap();
        assert_eq!(config.models.answer_generator, "gpt-5");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.models.sql_assistant, "gpt-5-mini");
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = Config::default();
        assert!(config.apply_profile("missing").is_err());
    }

    #[test]
    fn test_env_value_parsing() {
        let mut config = Config::default();
        config.set_value_from_env("RETRIEVAL__TOP_K", "7").unwrap();
        config.set_value_from_env("DEBUG__SQL", "true").unwrap();
        assert_eq!(config.retrieval.top_k, 7);
        assert!(config.debug.sql);

        assert!(config.set_value_from_env("DEBUG__TEXT", "maybe").is_err());
    }

    #[test]
    fn test_endpoint_defaults() {
        let mut llm = Config::default().llm;
        assert_eq!(llm.endpoint(), "https://api.openai.com/v1");

        llm.provider = "ollama".to_string();
        assert_eq!(llm.endpoint(), "http://localhost:11434/v1");
        assert!(!llm.requires_api_key());

        llm.base_url = Some("http://gateway:8080/v1/".to_string());
        assert_eq!(llm.endpoint(), "http://gateway:8080/v1");
    }

    #[test]
    fn test_resolve_models() {
        let models = Config::default().resolve_models().unwrap();
        assert_eq!(models.embeddings.name(), "text-embedding-3-small");
    }
}
