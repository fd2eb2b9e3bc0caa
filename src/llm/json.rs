//! Tolerant JSON extraction from completion text

use super::LlmError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Decode a JSON payload from a completion
///
/// Tries, in order: the whole text, the first fenced code block, and the
/// span between the first `{` and the last `}`.
pub fn extract_json<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let trimmed = content.trim();

    let first_error = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(block) = fence_regex()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1))
    {
        if let Ok(value) = serde_json::from_str(block.as_str()) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = trimmed.chars().take(200).collect();
    Err(LlmError::MalformedJson(format!("{} (payload: {})", first_error, preview)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_plain_object() {
        let v: Value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n{\"keywords\": [\"tofu\"]}\n```\n";
        let v: Value = extract_json(text).unwrap();
        assert_eq!(v["keywords"][0], "tofu");
    }

    #[test]
    fn test_embedded_object() {
        let v: Value = extract_json("Result: {\"ok\": true} done").unwrap();
        assert_eq!(v["ok"], true);
    }

    #[test]
    fn test_garbage() {
        let result: Result<Value, _> = extract_json("not json at all");
        assert!(matches!(result, Err(LlmError::MalformedJson(_))));
    }
}
