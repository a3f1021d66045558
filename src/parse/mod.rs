//! Type-directed parser
//!
//! Turns a raw value (ordered map, positional list, or an existing record) into a
//! `RecordInstance`, field by field in declaration order.
//!
//! Per field:
//! 1. take the raw value, the default, or fail on a missing required field
//! 2. remember it for descendants if the field propagates
//! 3. run the parse hook when converting
//! 4. keep null when the field admits it
//! 5. otherwise try each candidate type in order; first success wins
//!
//! Raw keys matching no field are dropped.

mod coerce;

use std::sync::Arc;

use crate::errors::{Error, ParsingError, Result, StructuralError};
use crate::format::{self, from_epoch};
use crate::observability::Event;
use crate::range::TemporalRange;
use crate::record::RecordInstance;
use crate::schema::{
    Candidate, Direction, FieldSpec, Group, Primitive, RecordType, ResolvedGroups, TemporalKind,
    DEFAULT_GROUP,
};
use crate::validate::{self, make_path, Mode, ValidateOptions};
use crate::value::{Value, ValueMap};

/// Path used for errors about the root value itself
const ROOT_PATH: &str = "$";

/// Options for one parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Metadata group to resolve
    pub group: String,
    /// Raw keys are aliases and are mapped back to canonical names
    pub by_alias: bool,
    /// Run parse hooks and convert strings into numbers, dates and enums
    pub convert: bool,
    /// Validate the finished record, failing with `Error::Validation`
    pub validate: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            by_alias: false,
            convert: false,
            validate: true,
        }
    }
}

impl ParseOptions {
    /// Options for text codecs: aliased keys, converting, validating
    pub fn external() -> Self {
        Self {
            by_alias: true,
            convert: true,
            ..Self::default()
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn by_alias(mut self, by_alias: bool) -> Self {
        self.by_alias = by_alias;
        self
    }

    pub fn convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Parses `raw` into an instance of `record_type`.
pub fn parse(record_type: &Arc<RecordType>, raw: Value, options: &ParseOptions) -> Result<RecordInstance> {
    let groups = record_type.resolve(&options.group)?;
    let parser = Parser { options };
    let instance = parser.record(record_type, groups, raw, "", options.by_alias)?;

    if options.validate {
        let validate_options = ValidateOptions {
            group: options.group.clone(),
            stop_on_fail: false,
        };
        validate::validate(&instance, Mode::Throw, &validate_options)?;
    }

    Event::RecordParsed.emit(&[("record", record_type.name()), ("group", &options.group)]);
    Ok(instance)
}

struct Parser<'a> {
    options: &'a ParseOptions,
}

/// Owning type, field spec and resolved groups of the field being parsed
struct FieldContext<'a> {
    owner: &'a RecordType,
    spec: &'a FieldSpec,
    field: &'a Group,
    schema: &'a Group,
}

impl Parser<'_> {
    fn record(
        &self,
        record_type: &Arc<RecordType>,
        groups: &ResolvedGroups,
        raw: Value,
        path: &str,
        by_alias: bool,
    ) -> Result<RecordInstance> {
        let (mut raw, by_alias) = match raw {
            Value::Map(map) => (map, by_alias),
            Value::Record(record) => ((*record).into_fields(), false),
            Value::List(items) => (positional(record_type, items)?, false),
            other => {
                return Err(ParsingError::invalid_shape(
                    record_type.name(),
                    if path.is_empty() { ROOT_PATH } else { path },
                    "map",
                    other.kind_name(),
                )
                .into())
            }
        };

        if by_alias {
            raw = unalias(record_type, groups, raw);
        }

        let mut fields = ValueMap::with_capacity(record_type.fields().len());
        let mut propagated = ValueMap::new();

        for (index, spec) in record_type.fields().iter().enumerate() {
            let field_path = make_path(path, spec.name());
            let value = match raw.shift_remove(spec.name()) {
                Some(value) => value,
                None => match spec.default_value() {
                    Some(default) => default.clone(),
                    None => {
                        return Err(ParsingError::missing_field(record_type.name(), &field_path).into())
                    }
                },
            };

            let ctx = FieldContext {
                owner: record_type,
                spec,
                field: groups.field(index),
                schema: groups.schema(),
            };

            if ctx.field.is_propagated() {
                propagated.insert(spec.name().to_string(), value.clone());
            }

            let parsed = self.field(&ctx, value, &field_path, &propagated, by_alias)?;
            fields.insert(spec.name().to_string(), parsed);
        }

        for key in raw.keys() {
            Event::RawKeyDiscarded.emit(&[("record", record_type.name()), ("key", key)]);
        }

        Ok(RecordInstance::new(Arc::clone(record_type), fields))
    }

    fn field(
        &self,
        ctx: &FieldContext<'_>,
        value: Value,
        path: &str,
        propagated: &ValueMap,
        by_alias: bool,
    ) -> Result<Value> {
        if self.options.convert {
            if let Some(hook) = ctx.field.parse_hook() {
                return hook
                    .apply(ctx.owner, Direction::Parse, &value)
                    .map_err(|cause| ParsingError::hook_failed(ctx.owner.name(), path, hook.label(), cause).into());
            }
        }

        if value.is_null() && ctx.spec.admits_null() {
            return Ok(Value::Null);
        }

        let mut last_error = None;
        for candidate in ctx.spec.candidates() {
            match self.candidate(ctx, candidate, &value, path, propagated, by_alias) {
                Ok(parsed) => return Ok(parsed),
                Err(err) if err.is_declaration() => return Err(err),
                Err(err) => {
                    let type_name = candidate.type_name();
                    Event::CandidateRejected.emit(&[
                        ("record", ctx.owner.name()),
                        ("field", path),
                        ("candidate", &type_name),
                    ]);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ParsingError::uncoercible(ctx.owner.name(), path, &ctx.spec.type_name(), value.kind_name()).into()
        }))
    }

    fn candidate(
        &self,
        ctx: &FieldContext<'_>,
        candidate: &Candidate,
        value: &Value,
        path: &str,
        propagated: &ValueMap,
        by_alias: bool,
    ) -> Result<Value> {
        let uncoercible =
            || Error::from(ParsingError::uncoercible(ctx.owner.name(), path, &candidate.type_name(), value.kind_name()));

        match candidate {
            Candidate::Primitive(kind) => match (kind, ctx.field.element_type()) {
                (Primitive::Array, Some(element)) => {
                    self.records(element, value, path, propagated, by_alias)
                }
                _ => coerce::primitive(*kind, value, self.options.convert).ok_or_else(uncoercible),
            },
            Candidate::Enum(enum_type) => {
                let coerced = match value {
                    Value::Enum(_) => enum_type.coerce(value),
                    _ if self.options.convert => enum_type.coerce(value),
                    _ => None,
                };
                coerced.map(Value::Enum).ok_or_else(uncoercible)
            }
            Candidate::Temporal(kind) => self.temporal(ctx, *kind, value, path).ok_or_else(uncoercible)?,
            Candidate::Range(kind) => self.range(ctx, *kind, value, path),
            Candidate::Record(nested) => self.nested(nested, value.clone(), path, propagated, by_alias),
            Candidate::ListOf(inner) => match inner.as_ref() {
                Candidate::Record(element) => self.records(element, value, path, propagated, by_alias),
                inner => self.elements(ctx, inner, value, path, propagated, by_alias),
            },
        }
    }

    /// `None` when the value is not a candidate for `kind` at all
    fn temporal(
        &self,
        ctx: &FieldContext<'_>,
        kind: TemporalKind,
        value: &Value,
        path: &str,
    ) -> Option<Result<Value>> {
        if kind.matches(value) {
            return Some(Ok(value.clone()));
        }
        if !self.options.convert {
            return None;
        }

        let uncoercible = |cause: format::FormatError| {
            Error::from(
                ParsingError::uncoercible(ctx.owner.name(), path, kind.type_name(), value.kind_name())
                    .caused_by(cause),
            )
        };

        match value {
            Value::String(s) => {
                let format = format::resolve(ctx.field, ctx.schema);
                Some(format.parse_str(kind, s).map_err(uncoercible))
            }
            Value::Int(secs) => Some(from_epoch(kind, *secs).map_err(uncoercible)),
            _ => None,
        }
    }

    /// Accepts a range of `kind`, a `start...finish` string when converting, or a
    /// `{start, finish}` map.
    fn range(&self, ctx: &FieldContext<'_>, kind: TemporalKind, value: &Value, path: &str) -> Result<Value> {
        let uncoercible = || ParsingError::uncoercible(ctx.owner.name(), path, kind.range_name(), value.kind_name());

        match value {
            Value::Range(range) if range.kind() == kind => Ok(value.clone()),
            Value::String(s) if self.options.convert => {
                let format = format::resolve(ctx.field, ctx.schema);
                TemporalRange::parse(kind, &format, s)
                    .map(Value::Range)
                    .map_err(|err| uncoercible().caused_by(err).into())
            }
            Value::Map(bounds) => {
                let bound = |key: &str| -> Result<Value> {
                    let raw = bounds.get(key).unwrap_or(&Value::Null);
                    let bound_path = make_path(path, key);
                    self.temporal(ctx, kind, raw, &bound_path).unwrap_or_else(|| {
                        Err(ParsingError::uncoercible(ctx.owner.name(), &bound_path, kind.type_name(), raw.kind_name())
                            .into())
                    })
                };
                let (start, finish) = (bound("start")?, bound("finish")?);
                TemporalRange::new(kind, &start, &finish)
                    .map(Value::Range)
                    .map_err(|err| uncoercible().caused_by(err).into())
            }
            _ => Err(uncoercible().into()),
        }
    }

    fn nested(
        &self,
        record_type: &Arc<RecordType>,
        value: Value,
        path: &str,
        propagated: &ValueMap,
        by_alias: bool,
    ) -> Result<Value> {
        let raw = match value {
            Value::Map(map) if !propagated.is_empty() => {
                let mut merged = propagated.clone();
                merged.extend(map);
                Value::Map(merged)
            }
            Value::Map(_) | Value::List(_) | Value::Record(_) => value,
            other => {
                return Err(ParsingError::invalid_shape(
                    record_type.name(),
                    path,
                    record_type.name(),
                    other.kind_name(),
                )
                .into())
            }
        };

        let groups = record_type.resolve_nested(&self.options.group)?;
        let instance = self.record(record_type, groups, raw, path, by_alias)?;
        Ok(Value::from(instance))
    }

    /// Collection of sub-records, keeping list positions or map keys
    fn records(
        &self,
        element: &Arc<RecordType>,
        value: &Value,
        path: &str,
        propagated: &ValueMap,
        by_alias: bool,
    ) -> Result<Value> {
        match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.nested(element, item.clone(), &format!("{}[{}]", path, i), propagated, by_alias)
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    let item_path = format!("{}[{}]", path, key);
                    self.nested(element, item.clone(), &item_path, propagated, by_alias)
                        .map(|parsed| (key.clone(), parsed))
                })
                .collect::<Result<ValueMap>>()
                .map(Value::Map),
            other => Err(ParsingError::invalid_shape(
                element.name(),
                path,
                &format!("collection of {}", element.name()),
                other.kind_name(),
            )
            .into()),
        }
    }

    /// Collection parsed element-wise with another candidate
    fn elements(
        &self,
        ctx: &FieldContext<'_>,
        inner: &Candidate,
        value: &Value,
        path: &str,
        propagated: &ValueMap,
        by_alias: bool,
    ) -> Result<Value> {
        let one = |item: &Value, item_path: &str| {
            if item.is_null() && matches!(inner, Candidate::Primitive(Primitive::Null | Primitive::Any)) {
                return Ok(Value::Null);
            }
            self.candidate(ctx, inner, item, item_path, propagated, by_alias)
        };

        match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| one(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| one(item, &format!("{}[{}]", path, key)).map(|v| (key.clone(), v)))
                .collect::<Result<ValueMap>>()
                .map(Value::Map),
            other => Err(ParsingError::invalid_shape(
                ctx.owner.name(),
                path,
                &format!("list<{}>", inner.type_name()),
                other.kind_name(),
            )
            .into()),
        }
    }
}

/// Maps a positional list onto declared field order.
fn positional(record_type: &RecordType, items: Vec<Value>) -> Result<ValueMap> {
    let declared = record_type.fields().len();
    let given = items.len();

    if let Some(missing) = record_type
        .fields()
        .iter()
        .skip(given)
        .find(|f| !f.is_optional())
    {
        return Err(StructuralError::field_count(record_type.name(), missing.name(), given, declared).into());
    }

    Ok(record_type
        .fields()
        .iter()
        .zip(items)
        .map(|(spec, value)| (spec.name().to_string(), value))
        .collect())
}

/// Renames alias keys to canonical field names.
fn unalias(record_type: &RecordType, groups: &ResolvedGroups, raw: ValueMap) -> ValueMap {
    raw.into_iter()
        .map(|(key, value)| {
            let canonical = match groups.index_of_key(&key) {
                Some(index) => record_type.fields()[index].name().to_string(),
                None => key,
            };
            (canonical, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::schema::{EnumType, MetadataEntry};
    use chrono::NaiveDate;
    use serde_json::json;

    fn raw(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn tag() -> Arc<RecordType> {
        RecordType::builder("Tag")
            .field(FieldSpec::new("name", Candidate::string()))
            .field(FieldSpec::new("owner", Candidate::string()).optional())
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_required_field() {
        let t = tag();
        let err = parse(&t, raw(json!({})), &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MissingField));
    }

    #[test]
    fn test_default_used_when_absent() {
        let t = tag();
        let r = parse(&t, raw(json!({"name": "rust"})), &ParseOptions::default()).unwrap();
        assert_eq!(r.get("owner"), Some(&Value::Null));
    }

    #[test]
    fn test_unknown_keys_discarded() {
        let t = tag();
        let r = parse(&t, raw(json!({"name": "rust", "extra": 1})), &ParseOptions::default()).unwrap();
        assert!(r.get("extra").is_none());
        assert_eq!(r.fields().len(), 2);
    }

    #[test]
    fn test_root_must_be_map() {
        let t = tag();
        let err = parse(&t, Value::from("x"), &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidShape));
    }

    #[test]
    fn test_union_precedence_float_then_enum() {
        let status = EnumType::backed("Status", &[("ACTIVE", "a"), ("BANNED", "b")]);
        let t = RecordType::builder("U")
            .field(FieldSpec::new("v", Candidate::float()).or(Candidate::enumeration(&status)))
            .build()
            .unwrap();
        let options = ParseOptions::default().convert(true);

        let r = parse(&t, raw(json!({"v": "ACTIVE"})), &options).unwrap();
        assert_eq!(r.get("v").and_then(Value::as_enum).map(|e| e.case.as_str()), Some("ACTIVE"));

        let r = parse(&t, raw(json!({"v": 4.3})), &options).unwrap();
        assert_eq!(r.get("v"), Some(&Value::Float(4.3)));
    }

    #[test]
    fn test_all_candidates_fail_reports_last() {
        let t = RecordType::builder("U")
            .field(FieldSpec::new("v", Candidate::int()).or(Candidate::date()))
            .build()
            .unwrap();
        let err = parse(&t, raw(json!({"v": true})), &ParseOptions::default()).unwrap_err();
        match err {
            Error::Parsing(e) => {
                assert_eq!(e.code(), ErrorCode::UncoercibleValue);
                assert!(e.message().contains("date"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dates_need_convert() {
        let t = RecordType::builder("D")
            .field(FieldSpec::new("day", Candidate::date()).format("Y-m-d"))
            .build()
            .unwrap();
        assert!(parse(&t, raw(json!({"day": "2024-03-02"})), &ParseOptions::default()).is_err());

        let r = parse(&t, raw(json!({"day": "2024-03-02"})), &ParseOptions::default().convert(true)).unwrap();
        assert_eq!(r.get("day"), Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())));
    }

    #[test]
    fn test_schema_format_applies_to_fields() {
        let t = RecordType::builder("D")
            .format("d.m.Y")
            .field(FieldSpec::new("day", Candidate::date()))
            .build()
            .unwrap();
        let r = parse(&t, raw(json!({"day": "02.03.2024"})), &ParseOptions::default().convert(true)).unwrap();
        assert_eq!(r.get("day"), Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())));
    }

    #[test]
    fn test_epoch_seconds_parse_into_datetime() {
        let t = RecordType::builder("E")
            .field(FieldSpec::new("at", Candidate::datetime()))
            .build()
            .unwrap();
        let r = parse(&t, raw(json!({"at": 1_735_689_600})), &ParseOptions::default().convert(true)).unwrap();
        assert_eq!(
            r.get("at"),
            Some(&Value::DateTime(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_positional_input() {
        let t = RecordType::builder("P")
            .field(FieldSpec::new("a", Candidate::int()))
            .field(FieldSpec::new("b", Candidate::int()))
            .field(FieldSpec::new("c", Candidate::int()).with_default(9))
            .build()
            .unwrap();

        let r = parse(&t, raw(json!([1, 2])), &ParseOptions::default()).unwrap();
        assert_eq!(r.get("c"), Some(&Value::Int(9)));

        let r = parse(&t, raw(json!([1, 2, 3, 4, 5])), &ParseOptions::default()).unwrap();
        assert_eq!(r.fields().len(), 3);
        assert_eq!(r.get("c"), Some(&Value::Int(3)));

        let err = parse(&t, raw(json!([1])), &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FieldCount));
    }

    #[test]
    fn test_range_from_string_and_bounds_map() {
        let t = RecordType::builder("Shift")
            .field(FieldSpec::new("hours", Candidate::time_range()).format("H:i"))
            .build()
            .unwrap();
        let convert = ParseOptions::default().convert(true);

        let r = parse(&t, raw(json!({"hours": "08:00...16:30"})), &convert).unwrap();
        let hours = r.get("hours").and_then(Value::as_range).unwrap();
        assert_eq!(hours.length(crate::range::RangeUnit::Minute), 8 * 60 + 30);

        let r = parse(&t, raw(json!({"hours": {"start": "09:00", "finish": "10:00"}})), &convert).unwrap();
        assert_eq!(r.get("hours").and_then(Value::as_range).map(|h| h.to_string()).as_deref(), Some("09:00:00...10:00:00"));

        assert!(parse(&t, raw(json!({"hours": "08:00...16:30"})), &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_inverted_range_is_a_parsing_error() {
        let t = RecordType::builder("Trip")
            .field(FieldSpec::new("dates", Candidate::date_range()).format("Y-m-d"))
            .build()
            .unwrap();
        let err = parse(&t, raw(json!({"dates": "2025-01-07...2025-01-01"})), &ParseOptions::default().convert(true))
            .unwrap_err();
        match err {
            Error::Parsing(e) => {
                assert_eq!(e.code(), ErrorCode::UncoercibleValue);
                assert_eq!(e.path(), "dates");
                assert!(std::error::Error::source(&e).is_some());
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = parse(&t, raw(json!({"dates": {"start": "2025-01-01"}})), &ParseOptions::default().convert(true))
            .unwrap_err();
        match err {
            Error::Parsing(e) => assert_eq!(e.path(), "dates.finish"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_positional_nested_falls_through_union() {
        let pair = RecordType::builder("Pair")
            .field(FieldSpec::new("a", Candidate::int()))
            .field(FieldSpec::new("b", Candidate::int()))
            .build()
            .unwrap();
        let either = RecordType::builder("Either")
            .field(FieldSpec::new("v", Candidate::record(&pair)).or(Candidate::array()))
            .build()
            .unwrap();

        let r = parse(&either, raw(json!({"v": [1]})), &ParseOptions::default()).unwrap();
        assert_eq!(r.get("v"), Some(&Value::List(vec![Value::Int(1)])));

        let r = parse(&either, raw(json!({"v": [1, 2]})), &ParseOptions::default()).unwrap();
        assert!(r.get("v").and_then(Value::as_record).is_some());

        let only = RecordType::builder("Only")
            .field(FieldSpec::new("v", Candidate::record(&pair)))
            .build()
            .unwrap();
        let err = parse(&only, raw(json!({"v": [1]})), &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FieldCount));
        assert!(err.is_structural());
        assert!(!err.is_declaration());
    }

    #[test]
    fn test_propagate_into_elements() {
        let event = RecordType::builder("Event")
            .field(FieldSpec::new("label", Candidate::string()))
            .field(FieldSpec::new("city", Candidate::string()))
            .build()
            .unwrap();
        let day = RecordType::builder("Day")
            .field(FieldSpec::new("city", Candidate::string()).propagate())
            .field(FieldSpec::new("events", Candidate::array()).element_type(&event))
            .build()
            .unwrap();

        let r = parse(
            &day,
            raw(json!({"city": "Oslo", "events": [{"label": "a"}, {"label": "b", "city": "Rome"}]})),
            &ParseOptions::default(),
        )
        .unwrap();

        let events = r.get("events").and_then(Value::as_list).unwrap();
        assert_eq!(events[0].as_record().unwrap().get("city"), Some(&Value::from("Oslo")));
        assert_eq!(events[1].as_record().unwrap().get("city"), Some(&Value::from("Rome")));
    }

    #[test]
    fn test_nested_error_path() {
        let tag = tag();
        let post = RecordType::builder("Post")
            .field(FieldSpec::new("tags", Candidate::list_of(Candidate::record(&tag))))
            .build()
            .unwrap();
        let err = parse(&post, raw(json!({"tags": [{"name": "a"}, {"name": 5}]})), &ParseOptions::default())
            .unwrap_err();
        match err {
            Error::Parsing(e) => assert_eq!(e.path(), "tags[1].name"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alias_remap_only_with_by_alias() {
        let t = RecordType::builder("A")
            .field(FieldSpec::new("date", Candidate::string()).group("input", vec![MetadataEntry::alias("dt")]))
            .build()
            .unwrap();
        let input = ParseOptions::default().group("input");

        let r = parse(&t, raw(json!({"dt": "x"})), &input.clone().by_alias(true)).unwrap();
        assert_eq!(r.get("date"), Some(&Value::from("x")));

        assert!(parse(&t, raw(json!({"dt": "x"})), &input).is_err());
    }

    #[test]
    fn test_unknown_group_is_structural() {
        let err = parse(&tag(), raw(json!({"name": "a"})), &ParseOptions::default().group("nope")).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_parse_hook_only_when_converting() {
        let t = RecordType::builder("Tags")
            .hook("parseTags", |v| {
                let s = v.as_str().ok_or("expected a string")?;
                Ok(Value::List(s.split('|').map(Value::from).collect()))
            })
            .field(FieldSpec::new("tags", Candidate::array()).parse_with(crate::schema::Hook::named("parseTags")))
            .build()
            .unwrap();

        let r = parse(&t, raw(json!({"tags": "a|b"})), &ParseOptions::default().convert(true)).unwrap();
        assert_eq!(r.get("tags"), Some(&raw(json!(["a", "b"]))));

        assert!(parse(&t, raw(json!({"tags": "a|b"})), &ParseOptions::default()).is_err());

        let err = parse(&t, raw(json!({"tags": 3})), &ParseOptions::default().convert(true)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::HookFailed));
    }
}
