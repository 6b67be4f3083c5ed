//! Field values and the normalized change event.
//!
//! Every control in the form system, whatever its native interaction, ends up
//! emitting a `FieldChange { name, value }`. Downstream concerns (dirty
//! tracking, payload construction, the caller's submit handler) only ever see
//! this one shape.

use serde_json::{Value as JsonValue, json};

/// Current value of a single form field.
///
/// The canonical "empty" value is `Text("")`: a cleared number or date field
/// goes back to the empty string, never to a missing key or a NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Tags(Vec<String>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Tags(t) => t.is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            FieldValue::Tags(t) => Some(t.as_slice()),
            _ => None,
        }
    }

    /// Human-readable rendering of the value ("12.5", not "12.500000").
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
            FieldValue::Tags(t) => t.join(", "),
        }
    }

    /// JSON form used when building the submit payload.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Text(s) => json!(s),
            FieldValue::Number(n) => json!(n),
            FieldValue::Bool(b) => json!(b),
            FieldValue::Tags(t) => json!(t),
        }
    }

    /// Inverse of `to_json`, used to prefill a form from a stored record.
    /// Anything that is not a string, number, bool, or string array degrades
    /// to the empty value rather than failing.
    pub fn from_json(value: &JsonValue) -> FieldValue {
        match value {
            JsonValue::String(s) => FieldValue::Text(s.clone()),
            JsonValue::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(FieldValue::empty),
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Array(items) => FieldValue::Tags(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            _ => FieldValue::empty(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// The single normalized change event every control emits.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub name: String,
    pub value: FieldValue,
}

impl FieldChange {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_the_empty_string() {
        assert_eq!(FieldValue::empty(), FieldValue::Text(String::new()));
        assert!(FieldValue::empty().is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
    }

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(3.0).display(), "3");
        assert_eq!(FieldValue::Number(12.5).display(), "12.5");
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        for v in [
            FieldValue::text("amoxicillin"),
            FieldValue::Number(250.0),
            FieldValue::Bool(true),
            FieldValue::Tags(vec!["morning".into(), "evening".into()]),
        ] {
            assert_eq!(FieldValue::from_json(&v.to_json()), v);
        }
    }

    #[test]
    fn unexpected_json_degrades_to_empty() {
        assert_eq!(FieldValue::from_json(&serde_json::json!(null)), FieldValue::empty());
        assert_eq!(
            FieldValue::from_json(&serde_json::json!({"nested": 1})),
            FieldValue::empty()
        );
    }
}
