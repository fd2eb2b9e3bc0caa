//! Per-question turn
//!
//! A turn runs the SQL channel and the text channel independently, then
//! hands both evidence blocks to answer synthesis. Every stage returns a
//! result or its degraded default, so once startup has succeeded a turn
//! always produces an answer.

use crate::config::{Config, ResolvedModels};
use crate::embedding::{EmbeddingService, LocalEmbedder};
use crate::error::{HyqaError, Result};
use crate::llm::{CompletionService, OpenAiClient};
use crate::models::Usage;
use crate::retrieval::{fuse_evidence, HybridSearcher, QueryExpander};
use crate::sql::{SqlDecomposer, NO_SQL_EVIDENCE};
use crate::storage::{Corpus, RelationalStore, SchemaMetadata, SqliteStore};
use crate::synthesis::AnswerSynthesizer;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Per-turn switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOptions {
    pub top_k: usize,
    pub debug_sql: bool,
    pub debug_text: bool,
}

impl AnswerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            debug_sql: config.debug.sql,
            debug_text: config.debug.text,
        }
    }
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            debug_sql: false,
            debug_text: false,
        }
    }
}

/// Pipeline knobs that are not per turn
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub expansion_versions: usize,
    pub enforce_read_only: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            expansion_versions: 3,
            enforce_read_only: true,
        }
    }
}

/// Everything one question produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    pub question: String,
    pub answer: String,
    /// Evidence actually handed to synthesis
    pub sql_evidence: String,
    pub text_evidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_trace: Option<String>,
    pub usage: Usage,
}

struct ChannelResult {
    evidence: String,
    trace: String,
    usage: Usage,
}

pub struct Pipeline {
    decomposer: SqlDecomposer,
    searcher: HybridSearcher,
    synthesizer: AnswerSynthesizer,
}

impl Pipeline {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        embedder: Arc<dyn EmbeddingService>,
        store: Arc<dyn RelationalStore>,
        schema: SchemaMetadata,
        corpus: Corpus,
        models: ResolvedModels,
        settings: PipelineSettings,
    ) -> Self {
        let decomposer = SqlDecomposer::new(
            completion.clone(),
            store,
            Arc::new(schema),
            models.sql_assistant,
        )
        .with_read_only_check(settings.enforce_read_only);

        let expander = QueryExpander::new(
            completion.clone(),
            models.text_assistant,
            settings.expansion_versions,
        );
        let searcher = HybridSearcher::new(expander, embedder, models.embeddings, Arc::new(corpus));

        let synthesizer = AnswerSynthesizer::new(completion, models.answer_generator);

        Self {
            decomposer,
            searcher,
            synthesizer,
        }
    }

    /// Load every resource named in `config` and connect the services
    ///
    /// Any failure here is fatal: the caller must not start answering
    /// questions with a half-built pipeline.
    pub fn from_config(config: &Config) -> Result<Self> {
        let models = config.resolve_models()?;

        let schema = SchemaMetadata::load(&config.paths.schema_metadata)?;
        let corpus = Corpus::load(&config.paths.chunks, &config.paths.articles)?;
        let store = SqliteStore::open(&config.paths.database)?;

        let client = Arc::new(OpenAiClient::from_config(
            &config.llm,
            &config.models.embeddings,
        )?);

        let embedder: Arc<dyn EmbeddingService> = match config.embedding.backend.as_str() {
            "local" => {
                let local = LocalEmbedder::new(&config.models.embeddings)
                    .map_err(|e| HyqaError::Config(format!("Local embedding backend: {}", e)))?;
                if let Some(expected) = corpus.dimension() {
                    if expected != local.dimension() {
                        return Err(HyqaError::Config(format!(
                            "Corpus embeddings are {}-dimensional but {} produces {}",
                            expected,
                            config.models.embeddings,
                            local.dimension()
                        )));
                    }
                }
                Arc::new(local)
            }
            _ => client.clone(),
        };

        let settings = PipelineSettings {
            expansion_versions: config.retrieval.expansion_versions,
            enforce_read_only: config.sql.enforce_read_only,
        };

        Ok(Self::new(
            client,
            embedder,
            Arc::new(store),
            schema,
            corpus,
            models,
            settings,
        ))
    }

    /// Answer one question
    ///
    /// Only an empty question is an error.
    pub fn answer(&self, question: &str, options: &AnswerOptions) -> Result<TurnOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(HyqaError::EmptyQuestion);
        }

        let turn_id = Uuid::new_v4();
        let span = tracing::info_span!("turn", id = %turn_id);
        let _guard = span.enter();

        tracing::info!("Answering question");

        let sql = self.sql_channel(question);
        let text = self.text_channel(question, options.top_k);

        let (answer, answer_usage) =
            self.synthesizer
                .synthesize(question, &sql.evidence, &text.evidence);

        let usage = sql.usage + text.usage + answer_usage;
        tracing::info!(
            cost = usage.total_cost(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Turn complete"
        );

        Ok(TurnOutcome {
            turn_id,
            question: question.to_string(),
            answer,
            sql_evidence: sql.evidence,
            text_evidence: text.evidence,
            sql_trace: options.debug_sql.then_some(sql.trace),
            text_trace: options.debug_text.then_some(text.trace),
            usage,
        })
    }

    fn sql_channel(&self, question: &str) -> ChannelResult {
        let (analysis, usage) = self.decomposer.analyze(question);

        let Some(analysis) = analysis else {
            tracing::warn!("No SQL analysis for this question");
            return ChannelResult {
                evidence: NO_SQL_EVIDENCE.to_string(),
                trace: "Failed to analyze the question with SQL.".to_string(),
                usage,
            };
        };

        let rendered = self.decomposer.render(&analysis);
        let evidence = if rendered.model_input.is_empty() {
            NO_SQL_EVIDENCE.to_string()
        } else {
            rendered.model_input
        };

        ChannelResult {
            evidence,
            trace: rendered.display,
            usage,
        }
    }

    fn text_channel(&self, question: &str, top_k: usize) -> ChannelResult {
        let outcome = self.searcher.search(question, top_k);
        let evidence = fuse_evidence(&outcome.semantic, &outcome.keyword);

        if let Some(id) = &evidence.keyword_article {
            tracing::debug!(article = %id, "Added keyword-only article to evidence");
        }

        ChannelResult {
            evidence: evidence.to_prompt(),
            trace: outcome.trace,
            usage: outcome.usage,
        }
    }
}
