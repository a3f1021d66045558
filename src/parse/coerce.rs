//! Scalar coercions used by primitive candidates

use crate::schema::Primitive;
use crate::value::Value;

/// Accepts `value` for a primitive candidate.
///
/// Without `convert` only exact kinds pass (int widens to float). With `convert`,
/// lossless conversions from strings are also tried.
pub(crate) fn primitive(kind: Primitive, value: &Value, convert: bool) -> Option<Value> {
    match (kind, value) {
        (Primitive::Any, v) => Some(v.clone()),
        (Primitive::Null, Value::Null) => Some(Value::Null),
        (Primitive::Bool, Value::Bool(_))
        | (Primitive::Int, Value::Int(_))
        | (Primitive::Float, Value::Float(_))
        | (Primitive::String, Value::String(_))
        | (Primitive::Array, Value::List(_))
        | (Primitive::Array, Value::Map(_)) => Some(value.clone()),
        (Primitive::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (kind, Value::String(s)) if convert => from_string(kind, s),
        _ => None,
    }
}

fn from_string(kind: Primitive, s: &str) -> Option<Value> {
    let trimmed = s.trim();
    match kind {
        Primitive::Int => trimmed.parse::<i64>().ok().map(Value::Int),
        Primitive::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        Primitive::Bool => match trimmed {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
