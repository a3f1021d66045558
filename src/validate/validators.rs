//! Built-in validator predicates and their failure messages

use std::cmp::Ordering;

use super::display::stringify;
use crate::record::RecordInstance;
use crate::schema::{Predicate, ValidatorKind};
use crate::value::Value;

/// Runs one validator against a field value of `record`.
pub(crate) fn check(kind: &ValidatorKind, value: &Value, record: &RecordInstance) -> bool {
    match kind {
        ValidatorKind::Contains(needle) => contains(value, needle),
        ValidatorKind::HasNo(needle) => !contains(value, needle),
        ValidatorKind::Exactly(expected) => value.loose_eq(expected),
        ValidatorKind::GreaterThan { bound, or_equal } => match value.compare(bound) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => *or_equal,
            _ => false,
        },
        ValidatorKind::LowerThan { bound, or_equal } => match value.compare(bound) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => *or_equal,
            _ => false,
        },
        ValidatorKind::Length { min, max } => {
            let len = length_of(value);
            len >= *min && len <= *max
        }
        ValidatorKind::NotEmpty => !is_empty(value),
        ValidatorKind::NotNull => !value.is_null(),
        ValidatorKind::OneOf(set) => set.iter().any(|v| value.loose_eq(v)),
        ValidatorKind::NotIn(set) => !set.iter().any(|v| value.loose_eq(v)),
        ValidatorKind::Plain => !value.elements().any(Value::is_collection),
        ValidatorKind::Custom { predicate, .. } => match predicate {
            Predicate::Func { f, .. } => f(value, record),
            Predicate::Named(name) => record
                .record_type()
                .predicate(name)
                .map_or(false, |f| f(value, record)),
        },
    }
}

/// Failure message for a value that did not pass `kind`.
pub(crate) fn message(kind: &ValidatorKind, value: &Value) -> String {
    let v = stringify(value);
    match kind {
        ValidatorKind::Contains(needle) => format!("{} ∉ {}", stringify(needle), v),
        ValidatorKind::HasNo(needle) => format!("{} ∈ {}", stringify(needle), v),
        ValidatorKind::Exactly(expected) => format!("{} != {}", v, stringify(expected)),
        ValidatorKind::GreaterThan { bound, or_equal } => {
            let sign = if *or_equal { "<" } else { "<=" };
            format!("{} {} {}", v, sign, stringify(bound))
        }
        ValidatorKind::LowerThan { bound, or_equal } => {
            let sign = if *or_equal { ">" } else { ">=" };
            format!("{} {} {}", v, sign, stringify(bound))
        }
        ValidatorKind::Length { min, max } => {
            format!("{} <= len({})={} <= {}", min, v, length_of(value), max)
        }
        ValidatorKind::NotEmpty => format!("!empty({})", v),
        ValidatorKind::NotNull => "NULL".to_string(),
        ValidatorKind::OneOf(set) => format!("{} ∉ {}", v, stringify_set(set)),
        ValidatorKind::NotIn(set) => format!("{} in {}", v, stringify_set(set)),
        ValidatorKind::Plain => format!("{} has nested arrays", v),
        ValidatorKind::Custom { predicate, message } => message
            .clone()
            .unwrap_or_else(|| format!("{}({})", predicate.label(), v)),
    }
}

fn stringify_set(set: &[Value]) -> String {
    stringify(&Value::List(set.to_vec()))
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
        (h, n) => h.elements().any(|e| e.loose_eq(n)),
    }
}

/// Element count of a collection, byte length of a string, digits of a number.
fn length_of(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Int(_) | Value::Float(_) => stringify(value).len(),
        Value::Null => 0,
        other => other.len().unwrap_or(0),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        Value::String(s) => s.is_empty() || s == "0",
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}
