//! Tolerant recovery of JSON values from model responses.
//!
//! Models asked for "JSON only" still wrap their answer in code fences,
//! prepend prose, or leave trailing commas. [`extract_json`] tries, in order:
//! a direct parse, a bracket-balanced scan from the first `[`/`{`, and a greedy
//! span from the first `[` to the last `]`. Each span also gets a second try
//! with trailing commas removed. The greedy span is only consulted when the
//! balanced scan hits a mismatched closer or runs off the end.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

mod scan;
mod shape;

use scan::Scan;

pub use shape::{Shape, WRAPPER_KEYS};

const PREVIEW_CHARS: usize = 120;

static FENCE_MARKER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").ok());

static TRAILING_COMMA: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r",\s*([}\]])").ok());

/// Recover a JSON value from arbitrary response text.
///
/// The value's shape is not checked; use [`extract_array`] or
/// [`Shape::classify`] when the caller expects a list.
///
/// # Errors
/// Returns [`Error::Unrecoverable`] when no strategy yields a value.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Some(value) = parse_value(trimmed) {
        return Ok(value);
    }

    let stripped = strip_fences(trimmed);
    let recovered = parse_value(&stripped).or_else(|| match scan::balanced_span(&stripped) {
        // A closed span is the answer; if it will not parse there is nothing to recover.
        Scan::Closed(span) => parse_lenient(span),
        Scan::Mismatch | Scan::Unterminated => {
            scan::greedy_array_span(&stripped).and_then(parse_lenient)
        }
    });

    recovered.ok_or_else(|| Error::Unrecoverable {
        preview: preview(trimmed),
    })
}

/// Recover a JSON array, unwrapping a single well-known wrapper key.
///
/// # Errors
/// [`Error::Unrecoverable`] if nothing parses, [`Error::ShapeMismatch`] if
/// the recovered value is not a list.
pub fn extract_array(text: &str) -> Result<Vec<Value>> {
    Shape::classify(extract_json(text)?).into_array()
}

/// Remove code fence markers, including a `json` language tag in any case.
#[must_use]
pub fn strip_fences(text: &str) -> String {
    match FENCE_MARKER.as_ref() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Drop commas that sit directly (modulo whitespace) before `]` or `}`.
#[must_use]
pub fn remove_trailing_commas(text: &str) -> String {
    match TRAILING_COMMA.as_ref() {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    }
}

// `null` is indistinguishable from "no answer", so it counts as a failed parse.
fn parse_value(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| !value.is_null())
}

fn parse_lenient(span: &str) -> Option<Value> {
    parse_value(span).or_else(|| parse_value(&remove_trailing_commas(span)))
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_array_directly() {
        assert_eq!(extract_json("[1, 2, 3]").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn recovers_fenced_array_with_prose_and_trailing_comma() {
        let text = "Sure! ```json\n[1, 2, 3,]\n```";
        assert_eq!(extract_json(text).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let text = "```JSON\n[4, 5]\n```";
        assert_eq!(extract_json(text).unwrap(), json!([4, 5]));
    }

    #[test]
    fn recovers_array_after_leading_prose() {
        let text = "Here are the relevant ids: [3, 7, 11]. Let me know if you need more.";
        assert_eq!(extract_json(text).unwrap(), json!([3, 7, 11]));
    }

    #[test]
    fn recovers_object_with_nested_trailing_commas() {
        let text = "Result:\n{\"clusters\": [{\"main\": 1, \"members\": [1, 2,],},]}\nDone.";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"clusters": [{"main": 1, "members": [1, 2]}]})
        );
    }

    #[test]
    fn brackets_inside_strings_do_not_end_the_scan() {
        let text = r#"ok: [{"id": 1, "reason": "tensions [rising] \"fast\" }"}] trailing"#;
        assert_eq!(
            extract_json(text).unwrap(),
            json!([{"id": 1, "reason": "tensions [rising] \"fast\" }"}])
        );
    }

    #[test]
    fn unbalanced_array_is_unrecoverable() {
        let err = extract_json("Selected: [1, 2, [3, 4]").unwrap_err();
        assert!(matches!(err, Error::Unrecoverable { .. }));
    }

    #[test]
    fn mismatched_brackets_are_unrecoverable() {
        assert!(extract_json("[1, 2}").is_err());
        assert!(extract_json("[1, {2]").is_err());
    }

    #[test]
    fn text_without_brackets_is_unrecoverable() {
        assert!(extract_json("I could not find anything relevant.").is_err());
        assert!(extract_json("").is_err());
        assert!(extract_json("null").is_err());
    }

    #[test]
    fn closed_span_that_fails_to_parse_ends_extraction() {
        let err = extract_json("Reasoning {see notes} then [1, 2]").unwrap_err();
        assert!(matches!(err, Error::Unrecoverable { .. }));
    }

    #[test]
    fn greedy_span_recovers_after_mismatched_closer() {
        let text = "Scores {oops] final: [3, 4]";
        assert_eq!(extract_json(text).unwrap(), json!([3, 4]));
    }

    #[test]
    fn greedy_span_recovers_when_scan_starts_on_prose_brace() {
        let text = "Note {unclosed: here is the list [1, 2,]";
        assert_eq!(extract_json(text).unwrap(), json!([1, 2]));
    }

    #[test]
    fn extract_array_unwraps_known_wrapper() {
        let text = r#"{"clusters": [{"main": 0, "members": [0]}]}"#;
        let items = extract_array(text).unwrap();
        assert_eq!(items, vec![json!({"main": 0, "members": [0]})]);
    }

    #[test]
    fn extract_array_rejects_plain_object() {
        let err = extract_array(r#"{"answer": 42}"#).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                expected: "array",
                found: "object"
            }
        );
    }

    #[test]
    fn trailing_comma_repair_only_touches_closers() {
        assert_eq!(remove_trailing_commas("[1, 2,\n]"), "[1, 2]");
        assert_eq!(remove_trailing_commas("{\"a\": 1, \"b\": 2}"), "{\"a\": 1, \"b\": 2}");
    }

    #[test]
    fn unrecoverable_preview_is_truncated() {
        let long = "x".repeat(500);
        let Error::Unrecoverable { preview } = extract_json(&long).unwrap_err() else {
            panic!("expected Unrecoverable");
        };
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }
}
