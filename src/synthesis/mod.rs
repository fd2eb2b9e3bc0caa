//! Answer synthesis from SQL and text evidence

use crate::llm::{complete_priced, CompletionRequest, CompletionService};
use crate::models::{Model, Usage};
use std::sync::Arc;

const SYSTEM_MESSAGE: &str = "You are a helpful database assistant that provides clear answers \
based on SQL query results.";

fn synthesis_prompt(question: &str, sql_evidence: &str, text_evidence: &str) -> String {
    format!(
        r#"You are a helpful assistant that answers questions based on database query results.

User Question: {question}

SQL Query Results:
{sql_evidence}

Text Search Results:
{text_evidence}

Based on the SQL query results above and the text search results, provide a clear, concise, and accurate answer to the user's question.
Format your response in a natural, conversational way. If the results show data in tables, summarize the key findings.
If there are no results or the query failed, explain that appropriately.

Do not suggest to do any follow up actions.
Do not mention the SQL queries or database structure in your answer.
Do not provide any external knowledge outside of the input data.
Do not reference to other data sources."#
    )
}

pub struct AnswerSynthesizer {
    completion: Arc<dyn CompletionService>,
    model: Model,
}

impl AnswerSynthesizer {
    pub fn new(completion: Arc<dyn CompletionService>, model: Model) -> Self {
        Self { completion, model }
    }

    /// Produce the final answer
    ///
    /// A failed call yields a diagnostic string as the answer and zero usage.
    pub fn synthesize(&self, question: &str, sql_evidence: &str, text_evidence: &str) -> (String, Usage) {
        let request = CompletionRequest::new(&self.model)
            .system(SYSTEM_MESSAGE)
            .user(synthesis_prompt(question, sql_evidence, text_evidence));

        match complete_priced(self.completion.as_ref(), &self.model, &request) {
            Ok((completion, usage)) => (completion.content, usage),
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                (format!("Error generating answer: {}", e), Usage::zero())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, LlmError};
    use crate::models::TokenCounts;
    use std::sync::Mutex;

    /// Records the prompt it was given
    #[derive(Default)]
    struct Recorder {
        prompt: Mutex<String>,
    }

    impl CompletionService for Recorder {
        fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
            if let Ok(mut prompt) = self.prompt.lock() {
                *prompt = request.prompt().to_string();
            }
            Ok(Completion {
                content: "There are 9 employees.".to_string(),
                tokens: TokenCounts::new(800, 12),
            })
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Down;

    impl CompletionService for Down {
        fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            Err(LlmError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    fn model() -> Model {
        Model::resolve("gpt-5-mini").unwrap()
    }

    #[test]
    fn test_prompt_carries_both_channels() {
        let recorder = Arc::new(Recorder::default());
        let synthesizer = AnswerSynthesizer::new(recorder.clone(), model());

        let (answer, usage) =
            synthesizer.synthesize("How many employees?", "Subtask 1: count", "Title: A, Text: b");

        assert_eq!(answer, "There are 9 employees.");
        assert_eq!(usage.output_tokens, 12);

        let prompt = recorder.prompt.lock().unwrap().clone();
        assert!(prompt.contains("User Question: How many employees?"));
        assert!(prompt.contains("SQL Query Results:\nSubtask 1: count"));
        assert!(prompt.contains("Text Search Results:\nTitle: A, Text: b"));
        assert!(prompt.contains("Do not mention the SQL queries"));
    }

    #[test]
    fn test_failure_becomes_diagnostic_answer() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(Down), model());

        let (answer, usage) = synthesizer.synthesize("q", "s", "t");

        assert!(answer.starts_with("Error generating answer: "));
        assert!(answer.contains("503"));
        assert!(usage.is_zero());
    }
}
