//! Schema metadata document
//!
//! Produced offline by asking a model to describe the database schema. The
//! decomposition prompt embeds the document verbatim; the typed view exists
//! so a broken document is rejected at startup.

use crate::error::{HyqaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One table or view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// "table" or "view"
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub description: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    database_name: String,
    #[serde(default)]
    description: Value,
    tables: Vec<TableMetadata>,
}

/// Immutable schema description, loaded once per process
#[derive(Debug, Clone)]
pub struct SchemaMetadata {
    pub database_name: String,
    pub description: Value,
    pub tables: Vec<TableMetadata>,
    prompt_text: String,
}

impl SchemaMetadata {
    /// Load and validate the metadata document
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HyqaError::Resource {
            path: path.to_path_buf(),
            message: format!("Cannot read schema metadata: {}", e),
        })?;

        let metadata = Self::from_json_str(&content).map_err(|e| HyqaError::Resource {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!(
            "Loaded schema metadata for '{}' ({} tables/views)",
            metadata.database_name,
            metadata.tables.len()
        );

        Ok(metadata)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content).map_err(|e| HyqaError::Json {
            source: e,
            context: "Schema metadata is not valid JSON".to_string(),
        })?;

        let document: SchemaDocument =
            serde_json::from_value(raw.clone()).map_err(|e| HyqaError::Json {
                source: e,
                context: "Schema metadata does not match the expected layout".to_string(),
            })?;

        let prompt_text = serde_json::to_string_pretty(&raw).map_err(|e| HyqaError::Json {
            source: e,
            context: "Failed to format schema metadata".to_string(),
        })?;

        Ok(Self {
            database_name: document.database_name,
            description: document.description,
            tables: document.tables,
            prompt_text,
        })
    }

    /// The full document, pretty-printed for prompts
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}
