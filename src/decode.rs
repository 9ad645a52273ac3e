//! Robust JSON extraction from free-form model output.
//!
//! The completion service gives no structural guarantee, so extraction
//! tries a fixed ladder of strategies, first success wins, every failure
//! silent:
//!
//! 1. Direct parse of the trimmed text
//! 2. Interior of the first fenced code block (```json or bare ```)
//! 3. First balanced `{...}` span
//! 4. First balanced `[...]` span
//! 5. Lenient repair (trailing commas, single-quote delimiters), then 3 again
//!
//! Absence of a parseable object is a normal outcome signaled by `None`;
//! nothing in this module can fail.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]+?)```").unwrap());

static TRAILING_COMMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Extract a structured value from raw model output.
pub fn decode(raw: &str) -> Option<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    // 1. Direct parse.
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    // 2. Fenced code block interior.
    if let Some(caps) = FENCED_BLOCK_REGEX.captures(text) {
        if let Some(interior) = caps.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(interior.as_str().trim()) {
                return Some(value);
            }
        }
    }

    // 3. First balanced object span.
    if let Some(span) = balanced_span(text, '{', '}') {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(value);
        }
    }

    // 4. First balanced array span.
    if let Some(span) = balanced_span(text, '[', ']') {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(value);
        }
    }

    // 5. Lenient repair, then the object scan again.
    let repaired = TRAILING_COMMA_REGEX
        .replace_all(text, "$1")
        .replace('\'', "\"");
    if let Some(span) = balanced_span(&repaired, '{', '}') {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(value);
        }
    }

    None
}

/// Extract and deserialize into a concrete type.
///
/// A value that extracts but does not fit `T` is treated the same as no
/// value at all.
pub fn decode_as<T: DeserializeOwned>(raw: &str) -> Option<T> {
    decode(raw).and_then(|value| serde_json::from_value(value).ok())
}

/// First balanced `open...close` span, by depth counting.
///
/// Deliberately string-unaware: a brace inside a quoted string can cut the
/// span short, in which case the parse fails and the next strategy runs.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..start + i + close.len_utf8()]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriticReview, LabelPrediction};

    #[test]
    fn test_decode_direct_object() {
        let value = decode(r#"{"label": "POSITIVE", "confidence": 90}"#).unwrap();
        assert_eq!(value["label"], "POSITIVE");
    }

    #[test]
    fn test_decode_direct_array() {
        let value = decode(r#"[1, 2, 3]"#).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_decode_fenced_json_block() {
        let raw = "```json\n{\"label\":\"X\",\"confidence\":90,\"reasoning\":\"ok\"}\n```";
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "X");
        assert_eq!(value["confidence"], 90);
        assert_eq!(value["reasoning"], "ok");
    }

    #[test]
    fn test_decode_fenced_untagged_block() {
        let raw = "Here you go:\n```\n{\"label\": \"NEGATIVE\"}\n```\nHope that helps!";
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "NEGATIVE");
    }

    #[test]
    fn test_decode_braces_embedded_in_prose() {
        let raw = "Sure! The answer is {\"label\": \"NEUTRAL\", \"confidence\": 55} as requested.";
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "NEUTRAL");
    }

    #[test]
    fn test_decode_takes_first_balanced_object() {
        let raw = r#"{"label": "FIRST"} and later {"label": "SECOND"}"#;
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "FIRST");
    }

    #[test]
    fn test_decode_nested_object_spans_fully() {
        let raw = r#"prefix {"outer": {"inner": 1}, "n": 2} suffix"#;
        let value = decode(raw).unwrap();
        assert_eq!(value["outer"]["inner"], 1);
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_decode_array_embedded_in_prose() {
        let raw = "criteria are [\"a\", \"b\"] as listed";
        let value = decode(raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_decode_repairs_trailing_comma() {
        let raw = r#"{"label": "MIXED", "confidence": 60,}"#;
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "MIXED");
    }

    #[test]
    fn test_decode_repairs_single_quotes() {
        let raw = "{'label': 'POSITIVE', 'confidence': 80}";
        let value = decode(raw).unwrap();
        assert_eq!(value["label"], "POSITIVE");
    }

    #[test]
    fn test_decode_plain_prose_is_none() {
        assert!(decode("I could not classify this item, sorry.").is_none());
        assert!(decode("").is_none());
        assert!(decode("   \n\t ").is_none());
    }

    #[test]
    fn test_decode_unbalanced_braces_is_none() {
        assert!(decode(r#"{"label": "TRUNCATED"#).is_none());
    }

    #[test]
    fn test_decode_as_prediction() {
        let raw = "```json\n{\"label\":\"POSITIVE\",\"confidence\":92,\"reasoning\":\"clear praise\"}\n```";
        let pred: LabelPrediction = decode_as(raw).unwrap();
        assert_eq!(pred.label, "POSITIVE");
        assert_eq!(pred.confidence, 92);
        assert!(pred.regions.is_empty());
    }

    #[test]
    fn test_decode_as_rejects_wrong_shape() {
        // Valid JSON, but not a CriticReview.
        let raw = r#"{"label": "POSITIVE", "confidence": 92, "reasoning": "x"}"#;
        assert!(decode_as::<CriticReview>(raw).is_none());
    }

    #[test]
    fn test_decode_as_review() {
        let raw = "verdict below\n{\"is_correct\": false, \"confidence_score\": 45, \"critique\": \"wrong polarity\"}";
        let review: CriticReview = decode_as(raw).unwrap();
        assert!(!review.is_correct);
        assert_eq!(review.confidence_score, 45);
    }
}
