//! Mutable per-modal form state.
//!
//! One instance lives for the duration of an open form and is discarded on
//! close. Validation messages are caller-supplied; this module never computes
//! them.

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value as JsonValue};

use super::field::{FieldDescriptor, FieldKind};
use super::value::FieldValue;

#[derive(Debug, Default, Clone)]
pub struct FormState {
    pub values: HashMap<String, FieldValue>,
    /// Per-field messages supplied by the caller after validation.
    pub field_errors: HashMap<String, String>,
    /// Form-level messages (e.g. a failed save).
    pub global_errors: Vec<String>,
    /// The record being edited; `None` while creating a new one.
    pub editing: Option<JsonValue>,
}

impl FormState {
    /// Prefill from a stored record: every field present in the record gets
    /// its value; everything else starts empty.
    pub fn from_record(fields: &[FieldDescriptor], record: JsonValue) -> Self {
        let mut state = FormState::default();
        if let Some(object) = record.as_object() {
            for field in fields {
                if let Some(raw) = object.get(&field.name) {
                    state
                        .values
                        .insert(field.name.clone(), FieldValue::from_json(raw));
                }
            }
        }
        state.editing = Some(record);
        state
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text view of a value; non-text values and missing keys read as "".
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn set_errors(&mut self, field_errors: HashMap<String, String>) {
        self.field_errors = field_errors;
    }

    pub fn clear_errors(&mut self) {
        self.field_errors.clear();
        self.global_errors.clear();
    }

    /// Build the submit payload: one JSON entry per non-divider field, typed
    /// by the stored value (numbers stay numbers, booleans stay booleans,
    /// tag lists stay arrays). Unset fields submit as the canonical empty.
    pub fn payload(&self, fields: &[FieldDescriptor]) -> JsonValue {
        let mut map = JsonMap::new();
        for field in fields {
            if matches!(field.kind, FieldKind::Divider) {
                continue;
            }
            let value = self
                .values
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| default_for(&field.kind));
            map.insert(field.name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

fn default_for(kind: &FieldKind) -> FieldValue {
    match kind {
        FieldKind::Checkbox => FieldValue::Bool(false),
        FieldKind::Tags { .. } => FieldValue::Tags(Vec::new()),
        _ => FieldValue::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", "Name", FieldKind::Text),
            FieldDescriptor::new("dose", "Dose", FieldKind::Number),
            FieldDescriptor::new("active", "Active", FieldKind::Checkbox),
            FieldDescriptor::divider("Extras"),
            FieldDescriptor::new("labels", "Labels", FieldKind::tags()),
        ]
    }

    #[test]
    fn payload_types_follow_values_and_skips_dividers() {
        let mut state = FormState::default();
        state.set("name", FieldValue::text("Metformin"));
        state.set("dose", FieldValue::Number(500.0));
        state.set("active", FieldValue::Bool(true));
        state.set("labels", FieldValue::Tags(vec!["diabetes".into()]));

        let payload = state.payload(&fields());
        assert_eq!(
            payload,
            json!({
                "name": "Metformin",
                "dose": 500.0,
                "active": true,
                "labels": ["diabetes"],
            })
        );
    }

    #[test]
    fn unset_fields_submit_canonical_empties() {
        let state = FormState::default();
        let payload = state.payload(&fields());
        assert_eq!(payload["name"], json!(""));
        assert_eq!(payload["active"], json!(false));
        assert_eq!(payload["labels"], json!([]));
    }

    #[test]
    fn prefill_reads_known_fields_only() {
        let record = json!({"name": "Lisinopril", "dose": 10, "discontinued_reason": "n/a"});
        let state = FormState::from_record(&fields(), record);
        assert!(state.is_editing());
        assert_eq!(state.get("name"), Some(&FieldValue::text("Lisinopril")));
        assert_eq!(state.get("dose"), Some(&FieldValue::Number(10.0)));
        assert_eq!(state.get("discontinued_reason"), None);
    }
}
