//! Collected validation failures

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Failures of one field: its own messages, failures inside a nested record, and
/// failures inside record elements of a collection keyed by index or map key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFailures {
    messages: Vec<String>,
    nested: Option<ValidationFailures>,
    elements: IndexMap<String, ValidationFailures>,
}

impl FieldFailures {
    pub(crate) fn push_message(&mut self, message: String) {
        self.messages.push(message);
    }

    pub(crate) fn set_nested(&mut self, nested: ValidationFailures) {
        if !nested.is_empty() {
            self.nested = Some(nested);
        }
    }

    pub(crate) fn insert_element(&mut self, key: String, failures: ValidationFailures) {
        if !failures.is_empty() {
            self.elements.insert(key, failures);
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn nested(&self) -> Option<&ValidationFailures> {
        self.nested.as_ref()
    }

    pub fn elements(&self) -> &IndexMap<String, ValidationFailures> {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.nested.is_none() && self.elements.is_empty()
    }

    fn to_json(&self) -> JsonValue {
        let elements = || {
            JsonValue::Object(
                self.elements
                    .iter()
                    .map(|(k, f)| (k.clone(), f.to_json()))
                    .collect::<Map<_, _>>(),
            )
        };

        if self.messages.is_empty() && self.nested.is_none() {
            return elements();
        }

        let mut out: Vec<JsonValue> = self.messages.iter().cloned().map(JsonValue::from).collect();
        if let Some(nested) = &self.nested {
            out.push(nested.to_json());
        }
        if !self.elements.is_empty() {
            out.push(elements());
        }
        JsonValue::Array(out)
    }
}

/// Failure map of one record, keyed by field name in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationFailures {
    fields: IndexMap<String, FieldFailures>,
}

impl ValidationFailures {
    pub(crate) fn insert(&mut self, field: &str, failures: FieldFailures) {
        if !failures.is_empty() {
            self.fields.insert(field.to_string(), failures);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failing fields at this level
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Names of failing fields at this level
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&FieldFailures> {
        self.fields.get(field)
    }

    /// Total number of messages, nested ones included
    pub fn count(&self) -> usize {
        self.flatten().len()
    }

    /// JSON rendering: a field maps to the list of its messages, followed by the
    /// nested record's failure object and the per-element failure object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, f)| (k.clone(), f.to_json()))
                .collect(),
        )
    }

    /// Every message paired with its dotted/indexed path, e.g. `events[1].name`.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for (name, field) in &self.fields {
            let path = make_path(prefix, name);
            for message in &field.messages {
                out.push((path.clone(), message.clone()));
            }
            if let Some(nested) = &field.nested {
                nested.flatten_into(&path, out);
            }
            for (key, element) in &field.elements {
                element.flatten_into(&format!("{}[{}]", path, key), out);
            }
        }
    }
}

/// Constructs a field path for error messages
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(field: &str, message: &str) -> ValidationFailures {
        let mut f = FieldFailures::default();
        f.push_message(message.to_string());
        let mut failures = ValidationFailures::default();
        failures.insert(field, f);
        failures
    }

    #[test]
    fn test_empty_entries_are_not_recorded() {
        let mut failures = ValidationFailures::default();
        failures.insert("age", FieldFailures::default());
        assert!(failures.is_empty());
    }

    #[test]
    fn test_flatten_paths() {
        let mut events = FieldFailures::default();
        events.insert_element("1".into(), leaf("name", "!empty('')"));
        let mut owner = FieldFailures::default();
        owner.set_nested(leaf("age", "3 <= 17"));

        let mut failures = ValidationFailures::default();
        failures.insert("events", events);
        failures.insert("owner", owner);

        assert_eq!(
            failures.flatten(),
            vec![
                ("events[1].name".to_string(), "!empty('')".to_string()),
                ("owner.age".to_string(), "3 <= 17".to_string()),
            ]
        );
        assert_eq!(failures.count(), 2);
    }

    #[test]
    fn test_to_json_shapes() {
        let mut events = FieldFailures::default();
        events.insert_element("0".into(), leaf("name", "m"));
        let mut failures = leaf("status", "'X' ∉ [\"a\"]");
        failures.insert("events", events);

        assert_eq!(
            failures.to_json(),
            json!({
                "status": ["'X' ∉ [\"a\"]"],
                "events": {"0": {"name": ["m"]}}
            })
        );
    }
}
