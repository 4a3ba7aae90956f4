//! Structured recovery — turns raw, possibly malformed completion output
//! into a JSON object through an ordered cascade of parsing strategies.
//!
//! Strategy order is load-bearing: the duplicate-object guard must run
//! before whole-text parsing, because a duplicated payload fails a naive
//! whole-text parse outright. First success wins; nothing here returns an
//! error to its caller.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Deserializer, Value};
use tracing::debug;

/// Which cascade strategy produced a recovered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FirstOfDuplicates,
    WholeText,
    FencedBlock,
    AnchorKeys,
    FieldScrape,
}

/// A recovered JSON object plus the strategy that found it.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub value: Value,
    pub strategy: Strategy,
}

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());
static TRAILING_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
static PERCENTILE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\([^)]*\)").unwrap());

/// Cleans up the quirks the generator habitually produces: single quotes
/// where JSON wants double quotes, trailing commas before a closing brace
/// or bracket, and percentile-style annotations after numbers
/// ("74.41(top decile)" → "74.41").
pub fn normalize_payload(text: &str) -> String {
    let text = text.replace('\'', "\"");
    let text = TRAILING_COMMA_RE.replace_all(&text, "$1");
    PERCENTILE_SUFFIX_RE.replace_all(&text, "$1").into_owned()
}

/// Parses a candidate span as a JSON object. The raw text is tried first so
/// already-valid JSON (apostrophes in strings included) survives untouched;
/// normalization only runs as the rescue attempt.
fn parse_object(candidate: &str) -> Option<Value> {
    let trimmed = candidate.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }
    match serde_json::from_str::<Value>(&normalize_payload(trimmed)) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Runs the generic cascade (strategies 1–4). `anchor_keys` are the marker
/// keys used to locate an object buried in prose. Returns `None` when no
/// strategy yields an object — the caller decides how to degrade.
pub fn recover_object(text: &str, anchor_keys: &[&str]) -> Option<Recovered> {
    if let Some(value) = first_of_duplicates(text) {
        debug!("recovered via duplicate-object guard");
        return Some(Recovered {
            value,
            strategy: Strategy::FirstOfDuplicates,
        });
    }
    if let Some(value) = parse_object(text) {
        debug!("recovered via whole-text parse");
        return Some(Recovered {
            value,
            strategy: Strategy::WholeText,
        });
    }
    if let Some(value) = fenced_block(text) {
        debug!("recovered via fenced-block parse");
        return Some(Recovered {
            value,
            strategy: Strategy::FencedBlock,
        });
    }
    if let Some(value) = anchor_span(text, anchor_keys) {
        debug!("recovered via anchor-key parse");
        return Some(Recovered {
            value,
            strategy: Strategy::AnchorKeys,
        });
    }
    None
}

/// Strategy 1: the generator sometimes echoes its answer twice. When one
/// object is immediately followed by the start of another, the first is
/// authoritative.
fn first_of_duplicates(text: &str) -> Option<Value> {
    duplicate_scan(text).or_else(|| duplicate_scan(&normalize_payload(text)))
}

fn duplicate_scan(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let candidate = &text[start..];
    let mut stream = Deserializer::from_str(candidate).into_iter::<Value>();
    let first = stream.next()?.ok()?;
    if !first.is_object() {
        return None;
    }
    let rest = candidate[stream.byte_offset()..].trim_start();
    if rest.starts_with('{') {
        Some(first)
    } else {
        None
    }
}

/// Strategy 3: a fenced code block whose content is an object.
fn fenced_block(text: &str) -> Option<Value> {
    let captures = FENCED_BLOCK_RE.captures(text)?;
    parse_object(captures.get(1)?.as_str())
}

/// Strategy 4: locate a JSON-shaped span by its required marker keys when
/// the object is surrounded by prose.
fn anchor_span(text: &str, anchor_keys: &[&str]) -> Option<Value> {
    if !anchor_keys
        .iter()
        .any(|key| text.contains(&format!("\"{key}\"")))
    {
        return None;
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}

/// Label/value scrape used by posting-specific fallbacks: extracts one
/// double-quoted string field by its JSON label.
pub fn scrape_string_field(text: &str, label: &str) -> Option<String> {
    let pattern = format!(r#""{}"[:\s]*"([^"]+)""#, regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text).map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicated_payload_returns_first_object_only() {
        let recovered = recover_object(r#"{"a":1}{"b":2}"#, &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::FirstOfDuplicates);
        assert_eq!(recovered.value, json!({"a": 1}));
    }

    #[test]
    fn test_duplicate_guard_handles_nested_objects() {
        let text = r#"{"outer":{"inner":1},"list":[1,2]} {"outer":{"inner":1}}"#;
        let recovered = recover_object(text, &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::FirstOfDuplicates);
        assert_eq!(recovered.value, json!({"outer":{"inner":1},"list":[1,2]}));
    }

    #[test]
    fn test_whole_text_round_trips_valid_json() {
        let original = json!({
            "title": "Jane's Team Lead",
            "nested": {"scores": [10.5, 100], "note": "it's fine"}
        });
        let text = serde_json::to_string(&original).unwrap();
        let recovered = recover_object(&text, &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::WholeText);
        assert_eq!(recovered.value, original);
    }

    #[test]
    fn test_whole_text_rescues_single_quotes_and_trailing_commas() {
        let recovered = recover_object("{'skill': 40, }", &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::WholeText);
        assert_eq!(recovered.value, json!({"skill": 40}));
    }

    #[test]
    fn test_fenced_block_with_json_tag() {
        let text = "Here is the analysis:\n```json\n{\"hard_skills\": {\"Rust\": 90}}\n```\nDone.";
        let recovered = recover_object(text, &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
        assert_eq!(recovered.value, json!({"hard_skills": {"Rust": 90}}));
    }

    #[test]
    fn test_fenced_block_without_tag() {
        let text = "```\n{\"a\": 1}\n```";
        let recovered = recover_object(text, &[]).unwrap();
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
    }

    #[test]
    fn test_anchor_keys_find_object_in_prose() {
        let text = r#"Sure! Based on the posting, {"hard_skills": {"Go": 80}, "insight": "cloud team"} — hope that helps."#;
        let recovered = recover_object(text, &["hard_skills", "soft_skills"]).unwrap();
        assert_eq!(recovered.strategy, Strategy::AnchorKeys);
        assert_eq!(recovered.value["insight"], "cloud team");
    }

    #[test]
    fn test_anchor_strategy_requires_a_marker_key() {
        // Prose with braces but no marker keys must not be anchor-parsed.
        let text = r#"the set {1, 2} is not what you want"#;
        assert!(recover_object(text, &["hard_skills"]).is_none());
    }

    #[test]
    fn test_percentile_suffix_normalization() {
        let recovered = recover_object(r#"{"Rust": 74.41(top decile), "SQL": 60(mid)}"#, &[]).unwrap();
        assert_eq!(recovered.value, json!({"Rust": 74.41, "SQL": 60}));
    }

    #[test]
    fn test_unrecoverable_text_returns_none() {
        assert!(recover_object("no structure here at all", &["hard_skills"]).is_none());
        assert!(recover_object("", &[]).is_none());
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        assert!(recover_object("[1, 2, 3]", &[]).is_none());
        assert!(recover_object("42", &[]).is_none());
    }

    #[test]
    fn test_scrape_string_field() {
        let text = r#"garbled "title": "Backend Engineer" more garble "company" : "Initech""#;
        assert_eq!(
            scrape_string_field(text, "title").as_deref(),
            Some("Backend Engineer")
        );
        assert_eq!(
            scrape_string_field(text, "company").as_deref(),
            Some("Initech")
        );
        assert!(scrape_string_field(text, "summary").is_none());
    }

    #[test]
    fn test_normalize_payload_strips_trailing_commas_in_arrays() {
        assert_eq!(normalize_payload(r#"{"a": [1, 2, ],}"#), r#"{"a": [1, 2]}"#);
    }
}
