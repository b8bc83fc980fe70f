//! Decision records: one model's verdict on one candidate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::CandidateId;

pub const DEFAULT_CATEGORY: &str = "Geopolitical";
pub const DEFAULT_REASON: &str = "Geopolitically Significant";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DecisionRecord {
    #[must_use]
    pub const fn bare(id: CandidateId) -> Self {
        Self {
            id,
            category: None,
            reason: None,
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or(DEFAULT_REASON)
    }

    /// Read one array element: a bare id or an object with an `id` field.
    ///
    /// Returns `None` if the id cannot be coerced or lies outside
    /// `[0, candidate_count)`.
    #[must_use]
    pub fn from_value(value: &Value, candidate_count: usize) -> Option<Self> {
        let (raw_id, category, reason) = match value {
            Value::Object(map) => (
                map.get("id")?,
                text_field(map.get("category")),
                text_field(map.get("reason")),
            ),
            other => (other, None, None),
        };

        let id = to_candidate_id(coerce_id(raw_id)?, candidate_count)?;
        Some(Self {
            id,
            category,
            reason,
        })
    }
}

/// Parse every recoverable decision out of an extracted array, in order.
#[must_use]
pub fn parse_decisions(items: &[Value], candidate_count: usize) -> Vec<DecisionRecord> {
    items
        .iter()
        .filter_map(|item| DecisionRecord::from_value(item, candidate_count))
        .collect()
}

/// Coerce a JSON value to an integer id.
///
/// Accepts integers, floats with no fractional part, and strings holding an
/// integer. Everything else is rejected.
#[must_use]
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(float_to_id)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Narrow a coerced id to the candidate range.
#[must_use]
pub fn to_candidate_id(raw: i64, candidate_count: usize) -> Option<CandidateId> {
    usize::try_from(raw).ok().filter(|id| *id < candidate_count)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "caller checked the float is integral and well inside i64"
)]
fn float_to_id(value: f64) -> i64 {
    value as i64
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_ids_and_records_mix() {
        let items = vec![
            json!(3),
            json!({"id": 1, "category": "Security", "reason": "Border clash"}),
            json!({"id": "2"}),
        ];
        let decisions = parse_decisions(&items, 5);
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0], DecisionRecord::bare(3));
        assert_eq!(decisions[1].category(), "Security");
        assert_eq!(decisions[1].reason(), "Border clash");
        assert_eq!(decisions[2].id, 2);
        assert_eq!(decisions[2].category(), DEFAULT_CATEGORY);
        assert_eq!(decisions[2].reason(), DEFAULT_REASON);
    }

    #[test]
    fn out_of_range_and_malformed_entries_are_dropped() {
        let items = vec![
            json!(-1),
            json!(5),
            json!("seven"),
            json!(1.5),
            json!(null),
            json!({"category": "no id"}),
            json!(4.0),
        ];
        let decisions = parse_decisions(&items, 5);
        assert_eq!(decisions, vec![DecisionRecord::bare(4)]);
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce_id(&json!(12)), Some(12));
        assert_eq!(coerce_id(&json!(" 8 ")), Some(8));
        assert_eq!(coerce_id(&json!(2.0)), Some(2));
        assert_eq!(coerce_id(&json!(2.5)), None);
        assert_eq!(coerce_id(&json!(true)), None);
        assert_eq!(coerce_id(&json!([1])), None);
    }

    #[test]
    fn blank_annotations_fall_back_to_placeholders() {
        let decision = DecisionRecord::from_value(&json!({"id": 0, "category": "  "}), 1).unwrap();
        assert_eq!(decision.category, None);
        assert_eq!(decision.category(), DEFAULT_CATEGORY);
    }
}
