//! Response parser — recovers exactly three copy strings from raw LLM
//! output.
//!
//! The model is instructed to return a JSON array, but format compliance
//! is not contractual. Strategies are an ordered chain of independent
//! pure attempts, tried in order and stopping at the first that yields
//! three non-empty fragments:
//!
//! 1. structured JSON (fence-stripped, embedded-JSON tolerant)
//! 2. numbered-list split ("1." / "1)" lines)
//! 3. blank-line paragraph split
//!
//! No transport or schema vocabulary leaks past this boundary: callers
//! see only `InsufficientVariants` or `Malformed`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Every generation must yield exactly this many variants.
pub const REQUIRED_VARIANTS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("fewer than {REQUIRED_VARIANTS} variants could be recovered from the model output")]
    InsufficientVariants,

    #[error("model output was empty or not parseable as text")]
    Malformed,
}

type Strategy = fn(&str) -> Option<Vec<String>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("json", extract_json_variants),
    ("numbered_list", split_numbered_list),
    ("paragraphs", split_paragraphs),
];

/// Extracts exactly three copy strings from raw model output.
pub fn parse(raw: &str) -> Result<[String; REQUIRED_VARIANTS], ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Malformed);
    }

    for (name, strategy) in STRATEGIES {
        let Some(candidates) = strategy(trimmed) else {
            continue;
        };
        let mut cleaned: Vec<String> = candidates
            .iter()
            .map(|c| strip_wrapping(c))
            .filter(|c| !c.is_empty())
            .collect();
        if cleaned.len() >= REQUIRED_VARIANTS {
            debug!("model output parsed via {name} strategy");
            cleaned.truncate(REQUIRED_VARIANTS);
            if let Ok(variants) = <[String; REQUIRED_VARIANTS]>::try_from(cleaned) {
                return Ok(variants);
            }
        }
    }

    Err(ParseError::InsufficientVariants)
}

// ────────────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────────────

/// Structured parse: the output is, or contains, a JSON array of strings
/// or objects carrying a copy/text/content field, possibly wrapped in an
/// object under "variations"/"copies" or buried in surrounding prose.
fn extract_json_variants(raw: &str) -> Option<Vec<String>> {
    let stripped = strip_code_fences(raw);
    let value = serde_json::from_str::<Value>(stripped)
        .ok()
        .or_else(|| find_embedded_json(stripped))?;

    let items: Vec<Value> = match &value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map
            .get("variations")
            .or_else(|| map.get("copies"))
            .and_then(Value::as_array)
            .cloned()
            .or_else(|| map.values().find_map(|v| v.as_array().cloned()))?,
        _ => return None,
    };

    let copies: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => ["copy", "text", "content"]
                .iter()
                .find_map(|key| obj.get(*key))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect();

    if copies.is_empty() {
        None
    } else {
        Some(copies)
    }
}

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d{1,2}[.)]\s+").expect("numbered item pattern is valid")
});

/// Splits on instructed numbering: lines beginning "1.", "2)", ...
fn split_numbered_list(raw: &str) -> Option<Vec<String>> {
    if !NUMBERED_ITEM.is_match(raw) {
        return None;
    }
    let items: Vec<String> = NUMBERED_ITEM
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.len() < 2 {
        None
    } else {
        Some(items)
    }
}

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern is valid"));

/// Last resort: blank-line-delimited paragraphs.
fn split_paragraphs(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = PARAGRAPH_BREAK
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.len() < 2 {
        None
    } else {
        Some(items)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cleanup helpers
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else {
        text
    }
}

/// Locates a JSON array or object embedded in surrounding prose.
fn find_embedded_json(text: &str) -> Option<Value> {
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if end > start {
                if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Removes residual markdown/quote wrapping from a candidate fragment.
fn strip_wrapping(fragment: &str) -> String {
    let mut s = fragment.trim();
    loop {
        let before = s;
        s = s
            .trim_start_matches("- ")
            .trim_start_matches("* ")
            .trim_start_matches("> ");
        for (open, close) in [("**", "**"), ("\"", "\""), ("'", "'"), ("`", "`"), ("“", "”")] {
            if s.len() > open.len() + close.len()
                && s.starts_with(open)
                && s.ends_with(close)
            {
                s = &s[open.len()..s.len() - close.len()];
            }
        }
        s = s.trim();
        if s == before {
            break;
        }
    }
    s.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_of_objects() {
        let raw = r#"[{"variation": 1, "copy": "First angle"},
                      {"variation": 2, "copy": "Second angle"},
                      {"variation": 3, "copy": "Third angle"}]"#;
        let variants = parse(raw).unwrap();
        assert_eq!(variants[0], "First angle");
        assert_eq!(variants[2], "Third angle");
    }

    #[test]
    fn test_json_array_of_strings() {
        let raw = r#"["Alpha copy", "Beta copy", "Gamma copy"]"#;
        let variants = parse(raw).unwrap();
        assert_eq!(variants[1], "Beta copy");
    }

    #[test]
    fn test_json_object_with_variations_key() {
        let raw = r#"{"variations": ["One", "Two", "Three"]}"#;
        assert_eq!(parse(raw).unwrap()[0], "One");
    }

    #[test]
    fn test_json_object_with_any_list_value() {
        let raw = r#"{"results": ["One", "Two", "Three"]}"#;
        assert_eq!(parse(raw).unwrap()[2], "Three");
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let raw = "```json\n[\"One\", \"Two\", \"Three\"]\n```";
        assert_eq!(parse(raw).unwrap()[0], "One");
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let raw = "Here are your variations:\n[\"One\", \"Two\", \"Three\"]\nHope these help!";
        assert_eq!(parse(raw).unwrap()[1], "Two");
    }

    #[test]
    fn test_objects_with_text_key() {
        let raw = r#"[{"text": "A"}, {"text": "B"}, {"text": "C"}]"#;
        assert_eq!(parse(raw).unwrap(), ["A", "B", "C"].map(String::from));
    }

    #[test]
    fn test_numbered_list_round_trip() {
        let items = ["Grab attention fast", "Lead with the benefit", "Close with urgency"];
        let raw = format!("1. {}\n2. {}\n3. {}", items[0], items[1], items[2]);
        let variants = parse(&raw).unwrap();
        assert_eq!(variants, items.map(String::from));
    }

    #[test]
    fn test_numbered_list_with_parens() {
        let raw = "1) One\n2) Two\n3) Three";
        assert_eq!(parse(raw).unwrap()[2], "Three");
    }

    #[test]
    fn test_multiline_numbered_items() {
        let raw = "1. First line\ncontinues here\n2. Second\n3. Third";
        let variants = parse(raw).unwrap();
        assert!(variants[0].contains("continues here"));
    }

    #[test]
    fn test_blank_line_paragraphs() {
        let raw = "Angle one stands alone.\n\nAngle two differs.\n\nAngle three closes.";
        let variants = parse(raw).unwrap();
        assert_eq!(variants[0], "Angle one stands alone.");
    }

    #[test]
    fn test_markdown_wrapping_stripped() {
        let raw = "1. **Bold copy here**\n2. \"Quoted copy\"\n3. - Dashed copy";
        let variants = parse(raw).unwrap();
        assert_eq!(variants[0], "Bold copy here");
        assert_eq!(variants[1], "Quoted copy");
        assert_eq!(variants[2], "Dashed copy");
    }

    #[test]
    fn test_two_items_is_insufficient() {
        let raw = "1. Only one\n2. And another";
        assert_eq!(parse(raw), Err(ParseError::InsufficientVariants));
    }

    #[test]
    fn test_two_json_items_is_insufficient() {
        let raw = r#"["One", "Two"]"#;
        assert_eq!(parse(raw), Err(ParseError::InsufficientVariants));
    }

    #[test]
    fn test_empty_output_is_malformed() {
        assert_eq!(parse(""), Err(ParseError::Malformed));
        assert_eq!(parse("   \n  "), Err(ParseError::Malformed));
    }

    #[test]
    fn test_single_block_of_prose_is_insufficient() {
        let raw = "Just one long paragraph of copy with no separation at all.";
        assert_eq!(parse(raw), Err(ParseError::InsufficientVariants));
    }

    #[test]
    fn test_extra_variants_truncated_to_three() {
        let raw = r#"["One", "Two", "Three", "Four", "Five"]"#;
        let variants = parse(raw).unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[2], "Three");
    }

    #[test]
    fn test_empty_json_strings_filtered_out() {
        let raw = r#"["", "Two", "Three"]"#;
        assert_eq!(parse(raw), Err(ParseError::InsufficientVariants));
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }
}
