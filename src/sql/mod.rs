//! SQL decomposition engine
//!
//! Turns a question plus the schema metadata document into read-only
//! subqueries, runs them against the relational store and renders the
//! results twice: a display trace that shows every subtask, and the
//! evidence block handed to answer synthesis, which only carries subtasks
//! that executed successfully.

mod guard;
mod prompt;

pub use guard::{check_read_only, GuardError};

use crate::llm::{complete_json, CompletionRequest, CompletionService};
use crate::models::{Model, Usage};
use crate::storage::{Cell, RelationalStore, SchemaMetadata, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rows shown per subtask before the remainder is summarised
pub const MAX_DISPLAY_ROWS: usize = 10;

/// Evidence handed to synthesis when the decomposition produced nothing
pub const NO_SQL_EVIDENCE: &str = "No SQL information available";

const RULE: &str = "================================================================================";

/// One executable step of a decomposed question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default)]
    pub description: String,
    pub sql_query: String,
    #[serde(default)]
    pub rationale: String,
}

/// Decomposition returned by the completion service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub relevant_tables: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Outcome of running one subtask
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryExecutionResult {
    Success {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
        row_count: usize,
    },
    Failure {
        error: String,
    },
}

impl QueryExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryExecutionResult::Success { .. })
    }
}

/// Display trace plus synthesis evidence for one analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedAnalysis {
    pub display: String,
    pub model_input: String,
}

pub struct SqlDecomposer {
    completion: Arc<dyn CompletionService>,
    store: Arc<dyn RelationalStore>,
    schema: Arc<SchemaMetadata>,
    model: Model,
    enforce_read_only: bool,
}

impl SqlDecomposer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn RelationalStore>,
        schema: Arc<SchemaMetadata>,
        model: Model,
    ) -> Self {
        Self {
            completion,
            store,
            schema,
            model,
            enforce_read_only: true,
        }
    }

    /// Toggle the local statement check (on by default)
    pub fn with_read_only_check(mut self, enabled: bool) -> Self {
        self.enforce_read_only = enabled;
        self
    }

    /// Ask the completion service to decompose `question`
    ///
    /// A failed call or an undecodable payload yields `None` with zero
    /// usage. The caller treats that as absent SQL evidence.
    pub fn analyze(&self, question: &str) -> (Option<Analysis>, Usage) {
        let request = CompletionRequest::new(&self.model)
            .system(prompt::SYSTEM_MESSAGE)
            .user(prompt::decomposition_prompt(self.schema.prompt_text(), question))
            .json();

        let (mut analysis, usage): (Analysis, Usage) =
            match complete_json(self.completion.as_ref(), &self.model, &request) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("SQL decomposition failed: {}", e);
                    return (None, Usage::zero());
                }
            };

        if self.enforce_read_only {
            analysis.subtasks.retain(|subtask| match check_read_only(&subtask.sql_query) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(sql = %subtask.sql_query, "Dropping subtask: {}", e);
                    false
                }
            });
        }

        tracing::debug!(
            subtasks = analysis.subtasks.len(),
            tables = ?analysis.relevant_tables,
            "Question decomposed"
        );

        (Some(analysis), usage)
    }

    /// Run one statement; errors become a failed result, never a panic
    pub fn execute(&self, sql: &str) -> QueryExecutionResult {
        match self.store.query(sql) {
            Ok(rows) => QueryExecutionResult::Success {
                row_count: rows.row_count(),
                columns: rows.columns,
                rows: rows.rows,
            },
            Err(StoreError::Sqlite(e)) => QueryExecutionResult::Failure {
                error: e.to_string(),
            },
            Err(e) => QueryExecutionResult::Failure {
                error: format!("Unexpected error: {}", e),
            },
        }
    }

    /// Execute every subtask and render both representations
    pub fn render(&self, analysis: &Analysis) -> RenderedAnalysis {
        let mut display = vec![
            RULE.to_string(),
            "DETAILED SQL ANALYSIS".to_string(),
            RULE.to_string(),
            String::new(),
            "Explanation:".to_string(),
            format!("   {}", analysis.explanation),
            String::new(),
            "Relevant Tables:".to_string(),
        ];
        display.extend(analysis.relevant_tables.iter().map(|t| format!("   - {}", t)));

        let mut model_input = Vec::new();

        for (idx, subtask) in analysis.subtasks.iter().enumerate() {
            let result = self.execute(&subtask.sql_query);
            let block = render_block(idx + 1, subtask, &result);

            match &result {
                QueryExecutionResult::Success { row_count, .. } => {
                    tracing::debug!(subtask = idx + 1, rows = row_count, "Subtask executed");
                    model_input.push(block.clone());
                }
                QueryExecutionResult::Failure { error } => {
                    tracing::warn!(subtask = idx + 1, "Subtask query failed: {}", error);
                }
            }

            display.push(String::new());
            display.push(block);
        }

        if analysis.subtasks.is_empty() {
            display.push(String::new());
            display.push("No subtasks were produced.".to_string());
        }
        display.push(RULE.to_string());

        RenderedAnalysis {
            display: display.join("\n"),
            model_input: model_input.join("\n\n"),
        }
    }
}

fn render_block(number: usize, subtask: &Subtask, result: &QueryExecutionResult) -> String {
    let mut lines = vec![
        format!("Subtask {}: {}", number, subtask.description),
        format!("   Rationale: {}", subtask.rationale),
        format!("   SQL Query: {}", subtask.sql_query),
    ];

    match result {
        QueryExecutionResult::Success {
            columns,
            rows,
            row_count,
        } if *row_count > 0 => {
            lines.push("   Results:".to_string());
            lines.push(format!("   {}", columns.join(" | ")));
            lines.push(format!("   {}", "-".repeat(60)));
            for row in rows.iter().take(MAX_DISPLAY_ROWS) {
                let cells: Vec<String> = row.iter().map(Cell::to_string).collect();
                lines.push(format!("   {}", cells.join(" | ")));
            }
            if *row_count > MAX_DISPLAY_ROWS {
                lines.push(format!("   ... ({} more rows)", row_count - MAX_DISPLAY_ROWS));
            }
        }
        QueryExecutionResult::Success { .. } => lines.push("   No rows returned.".to_string()),
        QueryExecutionResult::Failure { error } => {
            lines.push(format!("   Query failed: {}", error))
        }
    }

    lines.join("\n")
}
