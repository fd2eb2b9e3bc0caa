//! Blocking client for OpenAI-compatible chat and embedding APIs

use super::{Completion, CompletionRequest, CompletionService, LlmError, ResponseFormat};
use crate::config::LlmConfig;
use crate::embedding::{Embedding, EmbeddingError, EmbeddingService};
use crate::error::{HyqaError, Result};
use crate::models::TokenCounts;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP client for `/chat/completions` and `/embeddings`
///
/// Works against OpenAI itself and against Ollama's OpenAI-compatible
/// endpoint.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    provider: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingUsage {
    #[serde(default)]
    prompt_tokens: u64,
}

impl OpenAiClient {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        embedding_model: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, LlmError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
            embedding_model: embedding_model.into(),
            provider: provider.into(),
        })
    }

    /// Build the client from configuration
    ///
    /// A provider that needs a key fails here when the configured
    /// environment variable is unset or empty.
    pub fn from_config(config: &LlmConfig, embedding_model: &str) -> Result<Self> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ if config.requires_api_key() => {
                return Err(HyqaError::Config(format!(
                    "Environment variable {} is not set. Generate an API key and export it, \
                     e.g. export {}='your_api_key_here'",
                    config.api_key_env, config.api_key_env
                )));
            }
            _ => None,
        };

        let client = Self::new(
            config.provider.clone(),
            config.endpoint(),
            api_key,
            embedding_model,
            Duration::from_secs(config.timeout_secs),
        )
        .map_err(|e| HyqaError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            provider = %config.provider,
            endpoint = %client.base_url,
            "Completion client ready"
        );

        Ok(client)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> std::result::Result<T, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| LlmError::Request(format!("{}: {}", url, e)))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| LlmError::Request(format!("Failed to read body from {}: {}", url, e)))?;

        if !status.is_success() {
            let preview: String = text.chars().take(300).collect();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        // Gateways sometimes answer 200 with an HTML page
        if text.trim_start().starts_with('<') {
            let preview: String = text.chars().take(200).collect();
            return Err(LlmError::InvalidResponse(format!(
                "{} returned HTML instead of JSON: {}",
                url, preview
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })
    }
}

impl CompletionService for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> std::result::Result<Completion, LlmError> {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
        });
        if request.format == ResponseFormat::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response: ChatResponse = self.post("/chat/completions", &body)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Completion has no content".to_string()))?;

        let tokens = response
            .usage
            .map(|u| TokenCounts::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(Completion { content, tokens })
    }

    fn name(&self) -> &str {
        &self.provider
    }
}

impl EmbeddingService for OpenAiClient {
    fn embed(&self, text: &str) -> std::result::Result<Embedding, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });

        let response: EmbeddingResponse = self
            .post("/embeddings", &body)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))?;

        Ok(Embedding {
            vector,
            input_tokens: response.usage.map(|u| u.prompt_tokens).unwrap_or(0),
        })
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}
