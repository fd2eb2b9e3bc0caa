//! Completion service abstraction
//!
//! The pipeline talks to chat models only through [`CompletionService`].
//! [`OpenAiClient`] implements it (and the embedding service) against any
//! OpenAI-compatible HTTP API; tests plug in scripted stubs.

mod json;
mod openai;

pub use json::extract_json;
pub use openai::OpenAiClient;

use crate::models::{Model, TokenCounts, Usage};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed JSON in completion: {0}")]
    MalformedJson(String),
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Shape of the completion the caller expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// A single completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub format: ResponseFormat,
}

impl CompletionRequest {
    pub fn new(model: &Model) -> Self {
        Self {
            model: model.name().to_string(),
            messages: Vec::new(),
            format: ResponseFormat::Text,
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: Role::System,
            content: content.into(),
        });
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
        self
    }

    /// Ask the service for a JSON object
    pub fn json(mut self) -> Self {
        self.format = ResponseFormat::JsonObject;
        self
    }

    /// Content of the last user message
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Completion text plus raw token counters
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tokens: TokenCounts,
}

/// Trait for chat completion backends
pub trait CompletionService: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Run a completion and price it with `model`
pub fn complete_priced(
    service: &dyn CompletionService,
    model: &Model,
    request: &CompletionRequest,
) -> Result<(Completion, Usage), LlmError> {
    let start = Instant::now();
    let completion = service.complete(request)?;
    let usage = model.usage(completion.tokens, start.elapsed());

    tracing::debug!(
        backend = service.name(),
        model = model.name(),
        input_tokens = completion.tokens.input,
        output_tokens = completion.tokens.output,
        "Completion finished"
    );

    Ok((completion, usage))
}

/// Run a JSON completion and decode it into `T`
///
/// Usage is only reported when the whole call succeeds; a failed call or an
/// undecodable payload yields the error alone.
pub fn complete_json<T: serde::de::DeserializeOwned>(
    service: &dyn CompletionService,
    model: &Model,
    request: &CompletionRequest,
) -> Result<(T, Usage), LlmError> {
    let (completion, usage) = complete_priced(service, model, request)?;
    let value = extract_json(&completion.content)?;
    Ok((value, usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct Fixed(&'static str);

    impl CompletionService for Fixed {
        fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            Ok(Completion {
                content: self.0.to_string(),
                tokens: TokenCounts::new(1000, 200),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[derive(Deserialize)]
    struct Answer {
        value: u32,
    }

    #[test]
    fn test_request_builder() {
        let model = Model::resolve("gpt-5-mini").unwrap();
        let request = CompletionRequest::new(&model)
            .system("be brief")
            .user("hello")
            .json();

        assert_eq!(request.model, "gpt-5-mini");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.format, ResponseFormat::JsonObject);
        assert_eq!(request.prompt(), "hello");
    }

    #[test]
    fn test_complete_json_prices_call() {
        let model = Model::resolve("gpt-5").unwrap();
        let request = CompletionRequest::new(&model).user("q").json();

        let (answer, usage): (Answer, Usage) =
            complete_json(&Fixed(r#"{"value": 42}"#), &model, &request).unwrap();

        assert_eq!(answer.value, 42);
        assert_eq!(usage.input_tokens, 1000);
        assert!((usage.input_cost - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_complete_json_rejects_prose() {
        let model = Model::resolve("gpt-5").unwrap();
        let request = CompletionRequest::new(&model).user("q").json();

        let result: Result<(Answer, Usage), _> =
            complete_json(&Fixed("I cannot help with that"), &model, &request);
        assert!(matches!(result, Err(LlmError::MalformedJson(_))));
    }
}
