//! Dynamic values flowing in and out of the engine
//!
//! Raw inputs and typed record contents share one representation:
//! - scalars (`null`, `bool`, `int`, `float`, `string`)
//! - collections (`list`, ordered `map`)
//! - typed values produced by parsing (`date`, `datetime`, `time`, `range`, `enum`, `record`)
//!
//! Raw maps may therefore already contain typed values (a record handed back in for a
//! nested field, a date from a foreign object) and the parser accepts them as-is.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

use crate::range::TemporalRange;
use crate::record::RecordInstance;

/// Ordered string-keyed map of values.
pub type ValueMap = IndexMap<String, Value>;

/// Rendering used for dates when no record-level format applies.
pub const ISO_DATE: &str = "%Y-%m-%d";
/// Rendering used for date-times when no record-level format applies.
pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Rendering used for times when no record-level format applies.
pub const ISO_TIME: &str = "%H:%M:%S%.f";

/// Backing value of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumBacking {
    Str(String),
    Int(i64),
}

impl EnumBacking {
    pub fn to_value(&self) -> Value {
        match self {
            EnumBacking::Str(s) => Value::String(s.clone()),
            EnumBacking::Int(i) => Value::Int(*i),
        }
    }
}

/// A materialized enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Name of the enum type
    pub enum_name: String,
    /// Case name
    pub case: String,
    /// Backing value for backed enums
    pub backing: Option<EnumBacking>,
}

impl EnumValue {
    /// Plain representation: the backing value, or the case name for pure enums.
    pub fn plain(&self) -> Value {
        match &self.backing {
            Some(backing) => backing.to_value(),
            None => Value::String(self.case.clone()),
        }
    }
}

/// A dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Range(TemporalRange),
    Enum(EnumValue),
    Record(Box<RecordInstance>),
}

impl Value {
    /// Returns the kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Range(_) => "range",
            Value::Enum(_) => "enum",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for lists and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// True for dates, date-times and times.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_) | Value::Time(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&TemporalRange> {
        match self {
            Value::Range(range) => Some(range),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Number of elements of a collection.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Iterates collection elements in order, regardless of list or map shape.
    pub fn elements(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Value::List(items) => Box::new(items.iter()),
            Value::Map(map) => Box::new(map.values()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Loose equality: numbers compare across int/float, enums compare against their
    /// backing value or case name, dates compare against midnight date-times.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Enum(e), v) | (v, Value::Enum(e)) => {
                e.plain().loose_eq(v) || v.as_str() == Some(e.case.as_str())
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (a, b) if a.is_temporal() && b.is_temporal() => {
                a.compare(b) == Some(Ordering::Equal)
            }
            (a, b) => a == b,
        }
    }

    /// Ordering between comparable values; `None` when the kinds cannot be ordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::Time(_), _) | (_, Value::Time(_)) => None,
            (a, b) if a.is_temporal() && b.is_temporal() => {
                let left = temporal_as_datetime(a)?;
                let right = temporal_as_datetime(b)?;
                Some(left.cmp(&right))
            }
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Renders the value as JSON.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Promotes dates to midnight date-times; times are anchored on the epoch date.
pub fn temporal_as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        Value::DateTime(dt) => Some(*dt),
        Value::Time(t) => NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(*t)),
        _ => None,
    }
}

/// Seconds since midnight for a time value.
pub fn seconds_of_day(time: &NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Date(d) => serializer.collect_str(&d.format(ISO_DATE)),
            Value::DateTime(dt) => serializer.collect_str(&dt.format(ISO_DATETIME)),
            Value::Time(t) => serializer.collect_str(&t.format(ISO_TIME)),
            Value::Range(range) => serializer.collect_str(range),
            Value::Enum(e) => e.plain().serialize(serializer),
            Value::Record(record) => record.fields().serialize(serializer),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<TemporalRange> for Value {
    fn from(range: TemporalRange) -> Self {
        Value::Range(range)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<RecordInstance> for Value {
    fn from(record: RecordInstance) -> Self {
        Value::Record(Box::new(record))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = Value::from(json!({"b": 1, "a": 2.5, "c": [true, null]}));
        let map = value.as_map().unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map["b"], Value::Int(1));
        assert_eq!(map["a"], Value::Float(2.5));
    }

    #[test]
    fn test_loose_eq_across_numbers() {
        assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
        assert!(!Value::Int(2).loose_eq(&Value::String("2".into())));
    }

    #[test]
    fn test_loose_eq_enum_against_backing_and_name() {
        let e = Value::Enum(EnumValue {
            enum_name: "Status".into(),
            case: "ACTIVE".into(),
            backing: Some(EnumBacking::Str("a".into())),
        });
        assert!(e.loose_eq(&Value::from("a")));
        assert!(e.loose_eq(&Value::from("ACTIVE")));
        assert!(!e.loose_eq(&Value::from("b")));
    }

    #[test]
    fn test_compare_date_with_datetime() {
        let d = Value::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let dt = Value::DateTime(
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        assert_eq!(d.compare(&dt), Some(Ordering::Less));
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_serialize_temporal_as_iso() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_json(), json!("2024-03-02T08:30:00"));
        assert_eq!(
            Value::Date(dt.date()).to_json(),
            json!("2024-03-02")
        );
    }
}
