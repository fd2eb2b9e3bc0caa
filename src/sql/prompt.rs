//! Decomposition prompt

pub const SYSTEM_MESSAGE: &str = "You are an expert SQL database assistant. You analyze user \
questions and break them down into executable SQL queries. Always respond with valid JSON.";

/// Build the decomposition prompt around the verbatim schema document
pub fn decomposition_prompt(schema_document: &str, question: &str) -> String {
    format!(
        r#"You are a database query assistant. Given a user's question and database metadata, your task is to:

1. Explain what the user is asking for in clear terms
2. Identify which database tables are relevant to answer this question
3. Break down the question into logical subtasks
4. For each subtask, provide a SQL query that can be executed

Database Metadata:
```json
{schema_document}
```

Support only data retrieval operations, in case of data insert of modification request:
1. Return that "only select operations are supported"
2. Break and do not produce any subtasks

User Question: {question}

Please provide your response in the following JSON format:
{{
  "explanation": "Clear explanation of what the user is asking",
  "relevant_tables": ["table1", "table2", ...],
  "subtasks": [
    {{
      "description": "What this subtask accomplishes",
      "sql_query": "SELECT ... FROM ...",
      "rationale": "Why this query is needed"
    }}
  ]
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let prompt = decomposition_prompt("{\"tables\": []}", "How many employees are there?");
        assert!(prompt.contains("```json\n{\"tables\": []}\n```"));
        assert!(prompt.contains("User Question: How many employees are there?"));
        assert!(prompt.contains("only select operations are supported"));
        assert!(prompt.contains("\"sql_query\": \"SELECT ... FROM ...\""));
    }
}
