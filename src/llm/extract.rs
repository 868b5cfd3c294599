// ABOUTME: Structured response extractor recovering JSON payloads from free-form model text
// ABOUTME: Tries whole-text parse, fenced code blocks, then greedy brace matching; never fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Structured Response Extractor
//!
//! Models asked for JSON routinely wrap it in prose or code fences.
//! [`extract_json`] recovers a well-formed value anyway, trying in order:
//!
//! 1. the entire text is valid JSON
//! 2. the text contains a fenced code block (triple backtick, optional
//!    `json` language tag) whose interior is valid JSON
//! 3. the text contains a balanced `{...}` object found by greedy brace
//!    matching from the first `{` to the last `}`
//!
//! Returns `None` rather than an error when no attempt succeeds; callers
//! substitute a deterministic fallback value instead of failing the
//! user-facing operation.

use serde_json::Value;

/// Extract a JSON value from raw model output
///
/// Never panics and never returns an error; `None` signals "fall back to
/// templated/default structured data".
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Whole text is valid JSON
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // Fenced code block, optional "json" language tag
    if let Some(inner) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return Some(value);
        }
    }

    // Greedy brace match from the first '{' to the last '}'
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
}

/// Find the interior of the first triple-backtick fence, if any
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let close = after_open.find("```")?;
    let mut inner = &after_open[..close];

    // Strip an optional language tag on the opening fence line
    if let Some(rest) = inner.strip_prefix("json") {
        inner = rest;
    }
    Some(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_text_json() {
        let value = extract_json(r#"{"isValid": true}"#).unwrap();
        assert_eq!(value, json!({"isValid": true}));
    }

    #[test]
    fn test_fenced_block_with_tag() {
        let text = "Here is the result:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block_without_tag() {
        let text = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_brace_matching_in_prose() {
        let text = "Sure! The answer is {\"days\": [\"monday\"]} as you asked.";
        assert_eq!(extract_json(text).unwrap(), json!({"days": ["monday"]}));
    }

    #[test]
    fn test_prose_without_braces_returns_none() {
        assert!(extract_json("No structured data here, just words.").is_none());
        assert!(extract_json("").is_none());
        assert!(extract_json("   \n\t ").is_none());
    }

    #[test]
    fn test_unbalanced_braces_return_none() {
        assert!(extract_json("broken { \"a\": ").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn test_fenced_block_matches_direct_parse() {
        let inner = r#"{"isValid": false, "confidence": 0.5}"#;
        let wrapped = format!("Some prose.\n```json\n{inner}\n```\nMore prose.");
        assert_eq!(
            extract_json(&wrapped).unwrap(),
            serde_json::from_str::<Value>(inner).unwrap()
        );
    }
}
