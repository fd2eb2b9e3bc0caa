use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hyqa
///
/// Only configuration and resource problems surface through this type.
/// Failures of the completion, embedding and relational collaborators are
/// absorbed by the stage that called them.
#[derive(Error, Debug)]
pub enum HyqaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Model identifier missing from the model table
    #[error("Unsupported model '{name}', use one of {supported:?}")]
    UnsupportedModel {
        name: String,
        supported: Vec<&'static str>,
    },

    /// Metadata, corpus or database file unusable
    #[error("Resource error: {path}: {message}")]
    Resource { path: PathBuf, message: String },

    /// Question was empty after trimming
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for hyqa operations
pub type Result<T> = std::result::Result<T, HyqaError>;
