//! Permissive JSON extraction from model replies.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, StudyError};

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").ok())
        .as_ref()
}

/// Parse a model reply as `T`.
///
/// Tries the whole reply as JSON first, then the first fenced code block.
/// Anything else, including JSON that lacks required fields, is
/// [`StudyError::GenerationParse`].
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = extract_value(text)?;
    serde_json::from_value(value)
        .map_err(|e| StudyError::GenerationParse(format!("unexpected structure: {}", e)))
}

fn extract_value(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(text.trim()) {
        return Ok(value);
    }

    let block = fenced_block()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .ok_or_else(|| StudyError::GenerationParse("no JSON found in response".to_string()))?;

    serde_json::from_str(block.as_str())
        .map_err(|e| StudyError::GenerationParse(format!("invalid JSON in code block: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn parses_plain_json() {
        let s: Sample = parse_json(r#"  {"name": "a", "count": 2}  "#).unwrap();
        assert_eq!(s, Sample { name: "a".into(), count: 2 });
    }

    #[test]
    fn parses_fenced_json() {
        let text = "Here you go:\n```json\n{\"name\": \"b\"}\n```\nEnjoy!";
        let s: Sample = parse_json(text).unwrap();
        assert_eq!(s.name, "b");
    }

    #[test]
    fn parses_unlabelled_fence() {
        let text = "```\n{\"name\": \"c\"}\n```";
        let s: Sample = parse_json(text).unwrap();
        assert_eq!(s.name, "c");
    }

    #[test]
    fn uses_first_fence_only() {
        let text = "```json\n{\"name\": \"first\"}\n```\n```json\n{\"name\": \"second\"}\n```";
        let s: Sample = parse_json(text).unwrap();
        assert_eq!(s.name, "first");
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = parse_json::<Sample>("I cannot help with that.").unwrap_err();
        assert!(matches!(err, StudyError::GenerationParse(_)));
    }

    #[test]
    fn invalid_fenced_json_is_a_parse_error() {
        let err = parse_json::<Sample>("```json\n{name: oops}\n```").unwrap_err();
        assert!(matches!(err, StudyError::GenerationParse(_)));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let err = parse_json::<Sample>(r#"{"count": 1}"#).unwrap_err();
        assert!(err.to_string().contains("unexpected structure"));
    }
}
