//! Hybrid search combining semantic and keyword ranking

use super::{keyword_rank, semantic_rank, ExpandedQuery, KeywordHit, QueryExpander, SemanticHit};
use crate::embedding::{EmbeddingError, EmbeddingService};
use crate::models::{Model, TokenCounts, Usage};
use crate::storage::Corpus;
use std::sync::Arc;
use std::time::Instant;

const RULE: &str = "================================================================================";
const PREVIEW_CHARS: usize = 100;

/// Ranked hits of both channels for one question
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub queries: Vec<String>,
    pub keywords: Vec<String>,
    pub semantic: Vec<SemanticHit>,
    pub keyword: Vec<KeywordHit>,
    pub trace: String,
    /// Expansion plus embedding usage
    pub usage: Usage,
}

/// Hybrid searcher over an in-memory corpus
pub struct HybridSearcher {
    expander: QueryExpander,
    embedder: Arc<dyn EmbeddingService>,
    embedding_model: Model,
    corpus: Arc<Corpus>,
}

impl HybridSearcher {
    pub fn new(
        expander: QueryExpander,
        embedder: Arc<dyn EmbeddingService>,
        embedding_model: Model,
        corpus: Arc<Corpus>,
    ) -> Self {
        Self {
            expander,
            embedder,
            embedding_model,
            corpus,
        }
    }

    /// Expand, embed, rank both channels. Never fails; degraded stages
    /// just contribute nothing.
    pub fn search(&self, question: &str, top_k: usize) -> SearchOutcome {
        // Step 1: Paraphrases and keywords
        let ExpandedQuery {
            queries,
            keywords,
            usage: expansion_usage,
        } = self.expander.expand(question);

        // Step 2: Embed every query string
        let (query_vectors, embedding_usage) = self.embed_queries(&queries);

        // Step 3: Rank both channels over the full corpus
        let semantic = semantic_rank(&self.corpus.chunks, &query_vectors, top_k);
        let keyword = keyword_rank(&self.corpus.articles, &keywords, top_k);

        tracing::debug!(
            queries = queries.len(),
            vectors = query_vectors.len(),
            keywords = keywords.len(),
            semantic_hits = semantic.len(),
            keyword_hits = keyword.len(),
            "Text search finished"
        );

        let trace = render_trace(&queries, &keywords, &semantic, &keyword, top_k);

        SearchOutcome {
            queries,
            keywords,
            semantic,
            keyword,
            trace,
            usage: expansion_usage + embedding_usage,
        }
    }

    fn embed_queries(&self, queries: &[String]) -> (Vec<Vec<f32>>, Usage) {
        let mut vectors = Vec::with_capacity(queries.len());
        let mut usage = Usage::zero();

        for query in queries {
            let start = Instant::now();
            let embedding = self.embedder.embed(query).and_then(|e| {
                match self.corpus.dimension() {
                    Some(expected) if expected != e.vector.len() => {
                        Err(EmbeddingError::DimensionMismatch {
                            expected,
                            actual: e.vector.len(),
                        })
                    }
                    _ => Ok(e),
                }
            });

            match embedding {
                Ok(e) => {
                    usage += self
                        .embedding_model
                        .usage(TokenCounts::new(e.input_tokens, 0), start.elapsed());
                    vectors.push(e.vector);
                }
                Err(e) => tracing::warn!(
                    model = self.embedder.model_name(),
                    "Skipping query '{}': {}",
                    query,
                    e
                ),
            }
        }

        (vectors, usage)
    }
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Debug rendering of the expansion and every ranked hit
pub fn render_trace(
    queries: &[String],
    keywords: &[String],
    semantic: &[SemanticHit],
    keyword: &[KeywordHit],
    top_k: usize,
) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "QUERY INFO".to_string(),
        RULE.to_string(),
        format!("Query versions: {:?}", queries),
        format!("Keywords: {:?}", keywords),
        String::new(),
        RULE.to_string(),
        format!("SEMANTIC SEARCH RESULTS (Top {})", top_k),
        RULE.to_string(),
    ];

    for (idx, hit) in semantic.iter().enumerate() {
        lines.push(format!("\n{}. Article: {}", idx + 1, hit.article_id));
        lines.push(format!("   Title: {}", hit.title));
        lines.push(format!("   Similarity: {:.4}", hit.similarity));
        lines.push(format!("   Text: {}", preview(&hit.text)));
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.push(format!("KEYWORD SEARCH RESULTS (Top {})", top_k));
    lines.push(RULE.to_string());

    for (idx, hit) in keyword.iter().enumerate() {
        lines.push(format!("\n{}. Article: {}", idx + 1, hit.article_id));
        lines.push(format!("   Title: {}", hit.title));
        lines.push(format!(
            "   Matches: {} ({})",
            hit.match_count,
            hit.matched_keywords.join(", ")
        ));
        lines.push(format!("   Text: {}", preview(&hit.text)));
    }

    lines.join("\n")
}
