//! Value rendering used in validation messages

use crate::format::iso8601;
use crate::value::Value;

/// Renders a value for a failure message.
///
/// Strings are single-quoted, collections are compact JSON, temporal values are
/// ISO-8601 with offset, enums show their backing value or case name, and records
/// show their type name followed by pretty JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("'{}'", s),
        Value::List(_) | Value::Map(_) => value.to_json().to_string(),
        Value::Date(_) | Value::DateTime(_) | Value::Time(_) => iso8601(value).unwrap_or_default(),
        Value::Range(range) => range.to_string(),
        Value::Enum(e) => match e.plain() {
            Value::String(s) => s,
            other => other.to_json().to_string(),
        },
        Value::Record(record) => {
            let pretty = serde_json::to_string_pretty(&value.to_json()).unwrap_or_default();
            format!("{}{}", record.name(), pretty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{EnumBacking, EnumValue};
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(&Value::Null), "null");
        assert_eq!(stringify(&Value::from("x")), "'x'");
        assert_eq!(stringify(&Value::Int(17)), "17");
        assert_eq!(stringify(&Value::Float(4.5)), "4.5");
    }

    #[test]
    fn test_stringify_collections_as_json() {
        let v = Value::from(json!(["foo", 1, {"a": null}]));
        assert_eq!(stringify(&v), r#"["foo",1,{"a":null}]"#);
    }

    #[test]
    fn test_stringify_dates_as_atom() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(stringify(&Value::Date(d)), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_stringify_enums() {
        let backed = Value::Enum(EnumValue {
            enum_name: "Status".into(),
            case: "ACTIVE".into(),
            backing: Some(EnumBacking::Str("a".into())),
        });
        let pure = Value::Enum(EnumValue {
            enum_name: "Daytime".into(),
            case: "MORNING".into(),
            backing: None,
        });
        assert_eq!(stringify(&backed), "a");
        assert_eq!(stringify(&pure), "MORNING");
    }
}
