//! Tolerant response parser
//!
//! Two stages. Stage 1 looks for a JSON object (bare, inside a documentation
//! fence, or embedded in prose). Stage 2 runs only when stage 1 fails and scans
//! the raw text for individual `"key": value` pairs. Neither stage can fail:
//! the worst case is a record with every schema key null.

use crate::ExtractionSchema;
use doc_model::ExtractedRecord;
use regex_lite::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Which stage produced a parsed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Structured,
    Fallback,
}

/// Parse raw model output into a record containing every schema key.
pub fn parse_response(raw: &str, schema: &ExtractionSchema) -> ExtractedRecord {
    parse_response_with_stage(raw, schema).0
}

/// Like [`parse_response`], also reporting which stage succeeded
pub fn parse_response_with_stage(raw: &str, schema: &ExtractionSchema) -> (ExtractedRecord, ParseStage) {
    match parse_structured(raw) {
        Some(object) => {
            debug!(keys = object.len(), "Parsed structured model response");
            (record_from_object(object, schema), ParseStage::Structured)
        }
        None => {
            warn!(response_len = raw.len(), "Model response is not a JSON object, using fallback scan");
            (scan_fallback(raw, schema), ParseStage::Fallback)
        }
    }
}

/// Stage 1: find and decode a JSON object
fn parse_structured(raw: &str) -> Option<Map<String, Value>> {
    let mut candidates = Vec::new();
    if let Some(fenced) = fenced_body(raw) {
        candidates.push(fenced);
    }
    candidates.push(raw.trim());
    if let Some(sliced) = brace_slice(raw) {
        candidates.push(sliced);
    }

    candidates.into_iter().find_map(|candidate| {
        match serde_json::from_str::<Value>(candidate).ok()? {
            Value::Object(object) => Some(object),
            Value::Array(items) => match items.into_iter().next()? {
                Value::Object(object) => Some(object),
                _ => None,
            },
            _ => None,
        }
    })
}

/// Body of the first ```` ``` ```` fence, without its language tag
fn fenced_body(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after = &raw[open + 3..];
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(after.len());
    let body = &after[tag_len..];
    let close = body.find("```").unwrap_or(body.len());
    Some(body[..close].trim())
}

/// Text from the first `{` to the last `}`
fn brace_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn record_from_object(object: Map<String, Value>, schema: &ExtractionSchema) -> ExtractedRecord {
    let mut normalized: Map<String, Value> = Map::new();
    for (key, value) in object {
        let key = normalize_key(&key);
        if key.is_empty() {
            continue;
        }
        // a later duplicate only wins if it carries data
        let keep_existing =
            value.is_null() && normalized.get(&key).is_some_and(|existing| !existing.is_null());
        if !keep_existing {
            normalized.insert(key, value);
        }
    }

    let mut fields: Vec<(String, Option<String>)> = schema
        .keys()
        .map(|key| (key.to_string(), normalized.remove(key).and_then(value_to_text)))
        .collect();
    fields.extend(
        normalized
            .into_iter()
            .map(|(key, value)| (key, value_to_text(value))),
    );
    ExtractedRecord::from_fields(fields)
}

/// Fold a response key to `lower_snake_case`
fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Render one JSON value as record text; `None` for null-like values
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => clean_text(&s),
        Value::Array(items) => {
            if items.iter().all(|v| !v.is_array() && !v.is_object()) {
                let parts: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            } else {
                Some(Value::Array(items).to_string())
            }
        }
        Value::Object(map) => (!map.is_empty()).then(|| Value::Object(map).to_string()),
    }
}

fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let null_like = trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("n/a");
    (!null_like).then(|| trimmed.to_string())
}

/// Stage 2: per-key pattern scan over arbitrary text
fn scan_fallback(raw: &str, schema: &ExtractionSchema) -> ExtractedRecord {
    let fields = schema.keys().map(|key| (key.to_string(), scan_key(raw, key)));
    let record = ExtractedRecord::from_fields(fields);
    debug!(recovered = record.populated_count(), "Fallback scan finished");
    record
}

fn scan_key(raw: &str, key: &str) -> Option<String> {
    let pattern = format!(
        r#""{}"\s*:\s*(?:"((?:[^"\\]|\\.)*)"|(null)|(-?[0-9][0-9.]*))"#,
        regex_lite::escape(key)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(raw)?;
    if let Some(string) = caps.get(1) {
        let decoded = serde_json::from_str::<String>(&format!("\"{}\"", string.as_str()))
            .unwrap_or_else(|_| string.as_str().to_string());
        clean_text(&decoded)
    } else if let Some(number) = caps.get(3) {
        Some(number.as_str().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn schema() -> ExtractionSchema {
        ExtractionSchema::new()
            .with_field("insured_name", "name")
            .with_field("date_of_loss", "date")
            .with_field("roof_age", "years")
    }

    const OBJECT: &str =
        r#"{"insured_name": "Richard Daly", "date_of_loss": null, "roof_age": 12}"#;

    #[test]
    fn test_bare_object() {
        let (record, stage) = parse_response_with_stage(OBJECT, &schema());
        assert_eq!(stage, ParseStage::Structured);
        assert_eq!(record.get("insured_name"), Some("Richard Daly"));
        assert_eq!(record.get("date_of_loss"), None);
        assert_eq!(record.get("roof_age"), Some("12"));
    }

    #[test]
    fn test_fenced_object_parses_like_bare_object() {
        let bare = parse_response(OBJECT, &schema());
        for wrapped in [
            format!("```json\n{}\n```", OBJECT),
            format!("```\n{}\n```", OBJECT),
            format!("Here you go:\n```json\n{}\n```\nLet me know!", OBJECT),
            format!("```json {}```", OBJECT),
        ] {
            assert_eq!(parse_response(&wrapped, &schema()), bare, "input: {}", wrapped);
        }
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let raw = format!("Sure! The data is {} as requested.", OBJECT);
        assert_eq!(parse_response(&raw, &schema()).get("insured_name"), Some("Richard Daly"));
    }

    #[test]
    fn test_prose_falls_back_to_key_scan() {
        let raw = r#"I could not produce JSON, but "insured_name": "John Smith" appears in the report"#;
        let (record, stage) = parse_response_with_stage(raw, &schema());
        assert_eq!(stage, ParseStage::Fallback);
        assert_eq!(record.get("insured_name"), Some("John Smith"));
        assert_eq!(record.get("date_of_loss"), None);
        assert_eq!(record.get("roof_age"), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_fallback_handles_escapes_null_and_numbers() {
        let raw = r#"broken { "insured_name": "Jane \"JJ\" Doe", "date_of_loss": null, "roof_age": 15,"#;
        let record = parse_response(raw, &schema());
        assert_eq!(record.get("insured_name"), Some("Jane \"JJ\" Doe"));
        assert_eq!(record.get("date_of_loss"), None);
        assert_eq!(record.get("roof_age"), Some("15"));
    }

    #[test]
    fn test_null_like_strings_become_null() {
        let raw = r#"{"insured_name": "N/A", "date_of_loss": "None", "roof_age": "  "}"#;
        let record = parse_response(raw, &schema());
        assert_eq!(record.populated_count(), 0);
    }

    #[test]
    fn test_arrays_and_objects_render_as_text() {
        let raw = r#"{"insured_name": ["Richard Daly", "Ann Daly"], "extra": {"a": 1}}"#;
        let record = parse_response(raw, &schema());
        assert_eq!(record.get("insured_name"), Some("Richard Daly, Ann Daly"));
        assert_eq!(record.get("extra"), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_extra_keys_follow_schema_keys() {
        let raw = r#"{"Zeta Key": "z", "roof_age": "10", "Alpha-Key": "a"}"#;
        let record = parse_response(raw, &schema());
        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["insured_name", "date_of_loss", "roof_age", "alpha_key", "zeta_key"]);
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(normalize_key("Insured Name"), "insured_name");
        assert_eq!(normalize_key("  date-of--loss "), "date_of_loss");
        assert_eq!(normalize_key("__"), "");
    }

    #[test]
    fn test_array_wrapped_object() {
        let raw = format!("[{}]", OBJECT);
        assert_eq!(parse_response(&raw, &schema()).get("insured_name"), Some("Richard Daly"));
    }

    #[test]
    fn test_garbage_yields_all_null_schema_record() {
        let record = parse_response("<<<not json at all>>>", &schema());
        assert_eq!(record.len(), 3);
        assert_eq!(record.populated_count(), 0);
    }

    #[test]
    fn test_empty_response() {
        let record = parse_response("", &ExtractionSchema::insurance_report());
        assert_eq!(record.len(), 25);
        assert_eq!(record.populated_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_parse_never_fails_and_covers_schema(raw in any::<String>()) {
            let record = parse_response(&raw, &schema());
            for key in schema().keys() {
                prop_assert!(record.contains_key(key));
            }
        }

        #[test]
        fn prop_jsonish_noise_never_fails(raw in r#"[\{\}\[\]":,a-z0-9 `\\n]{0,80}"#) {
            let record = parse_response(&raw, &schema());
            prop_assert!(record.len() >= 3);
        }
    }
}
