//! Query expansion: paraphrases plus salient keywords

use crate::llm::{complete_json, CompletionRequest, CompletionService};
use crate::models::{Model, Usage};
use ahash::AHashSet;
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM_MESSAGE: &str = "You are a helpful assistant that generates query variations and \
extracts keywords for semantic search.";

#[derive(Debug, Deserialize)]
struct ExpansionReply {
    #[serde(default)]
    query_versions: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Query strings to embed and keywords to count
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedQuery {
    /// Original question first, then paraphrases
    pub queries: Vec<String>,
    pub keywords: Vec<String>,
    pub usage: Usage,
}

impl ExpandedQuery {
    /// The degraded form used when expansion fails
    pub fn fallback(question: &str) -> Self {
        Self {
            queries: vec![question.to_string()],
            keywords: Vec::new(),
            usage: Usage::zero(),
        }
    }
}

pub struct QueryExpander {
    completion: Arc<dyn CompletionService>,
    model: Model,
    versions: usize,
}

impl QueryExpander {
    pub fn new(completion: Arc<dyn CompletionService>, model: Model, versions: usize) -> Self {
        Self {
            completion,
            model,
            versions: versions.max(1),
        }
    }

    pub fn expand(&self, question: &str) -> ExpandedQuery {
        let request = CompletionRequest::new(&self.model)
            .system(SYSTEM_MESSAGE)
            .user(expansion_prompt(question, self.versions))
            .json();

        let (reply, usage): (ExpansionReply, Usage) =
            match complete_json(self.completion.as_ref(), &self.model, &request) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Query expansion failed, searching with the question only: {}", e);
                    return ExpandedQuery::fallback(question);
                }
            };

        let mut queries = vec![question.to_string()];
        queries.extend(
            reply
                .query_versions
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .take(self.versions),
        );

        ExpandedQuery {
            queries,
            keywords: normalize_keywords(reply.keywords),
            usage,
        }
    }
}

fn expansion_prompt(question: &str, versions: usize) -> String {
    let placeholders: Vec<String> = (1..=versions).map(|i| format!("\"version{}\"", i)).collect();

    format!(
        r#"Given the user query below, generate {versions} similar search queries that maintain the same meaning but use different wording, sampled from the full distribution. Also extract 3-5 important keywords for text search which are not common widely used words.

User Query: "{question}"

Respond in JSON format:
{{
  "query_versions": [{placeholders}],
  "keywords": ["keyword1", "keyword2", "keyword3", ...]
}}"#,
        placeholders = placeholders.join(", ")
    )
}

/// Trim, drop empties and case-insensitive duplicates, keep first spelling
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = AHashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect()
}
