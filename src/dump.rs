//! Type-directed dumper
//!
//! Turns a record back into an ordered map. Nested records always become maps.
//! With `stringify`, dump hooks run and temporal, range and enum values become plain
//! data (formatted strings or epoch seconds, `start...finish` strings, backing values or
//! case names).

use crate::errors::{DumpError, Result, StructuralError};
use crate::format;
use crate::record::RecordInstance;
use crate::schema::{Direction, Group, RecordType, ResolvedGroups, DEFAULT_GROUP};
use crate::validate::make_path;
use crate::value::{Value, ValueMap};

/// Options for one dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    pub group: String,
    /// Omit record fields whose dumped value is null
    pub skip_nulls: bool,
    /// Emit aliases instead of canonical field names
    pub by_alias: bool,
    /// Run dump hooks and render temporal and enum values as plain data
    pub stringify: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            skip_nulls: false,
            by_alias: false,
            stringify: false,
        }
    }
}

impl DumpOptions {
    /// Options for text codecs: aliased keys, stringified values
    pub fn external() -> Self {
        Self {
            by_alias: true,
            stringify: true,
            ..Self::default()
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn skip_nulls(mut self, skip_nulls: bool) -> Self {
        self.skip_nulls = skip_nulls;
        self
    }

    pub fn by_alias(mut self, by_alias: bool) -> Self {
        self.by_alias = by_alias;
        self
    }

    pub fn stringify(mut self, stringify: bool) -> Self {
        self.stringify = stringify;
        self
    }
}

/// Dumps `instance` into an ordered map.
pub fn dump(instance: &RecordInstance, options: &DumpOptions) -> Result<ValueMap> {
    let groups = instance.record_type().resolve(&options.group)?;
    Dumper { options }.record(instance, groups, "")
}

struct Dumper<'a> {
    options: &'a DumpOptions,
}

impl Dumper<'_> {
    fn record(&self, instance: &RecordInstance, groups: &ResolvedGroups, path: &str) -> Result<ValueMap> {
        let record_type = instance.record_type();
        let mut out = ValueMap::with_capacity(record_type.fields().len());

        for (index, spec) in record_type.fields().iter().enumerate() {
            let field = groups.field(index);
            let field_path = make_path(path, spec.name());
            let value = instance.get(spec.name()).unwrap_or(&Value::Null);

            let dumped = match field.dump_hook() {
                Some(hook) if self.options.stringify => hook
                    .apply(record_type, Direction::Dump, value)
                    .map_err(|cause| {
                        DumpError::hook_failed(record_type.name(), &field_path, hook.label(), cause)
                    })?,
                _ => self.value(record_type, field, groups.schema(), value, &field_path)?,
            };

            if self.options.skip_nulls && dumped.is_null() {
                continue;
            }

            let key = match field.alias() {
                Some(alias) if self.options.by_alias => alias,
                _ => spec.name(),
            };
            out.insert(key.to_string(), dumped);
        }

        Ok(out)
    }

    fn value(
        &self,
        owner: &RecordType,
        field: &Group,
        schema: &Group,
        value: &Value,
        path: &str,
    ) -> Result<Value> {
        match value {
            Value::Record(nested) => {
                let groups = nested.record_type().resolve_nested(&self.options.group)?;
                Ok(Value::Map(self.record(nested, groups, path)?))
            }
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.value(owner, field, schema, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    self.value(owner, field, schema, item, &format!("{}[{}]", path, key))
                        .map(|dumped| (key.clone(), dumped))
                })
                .collect::<Result<ValueMap>>()
                .map(Value::Map),
            Value::Enum(e) if self.options.stringify => Ok(e.plain()),
            Value::Range(range) if self.options.stringify => range
                .render(&format::resolve(field, schema))
                .map(Value::String)
                .map_err(|err| StructuralError::invalid_declaration(owner.name(), Some(path), err.to_string()).into()),
            temporal if self.options.stringify && temporal.is_temporal() => format::resolve(field, schema)
                .render(temporal)
                .map_err(|err| StructuralError::invalid_declaration(owner.name(), Some(path), err.to_string()).into()),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse, ParseOptions};
    use crate::schema::{Candidate, EnumType, FieldSpec, Hook, MetadataEntry};
    use serde_json::json;
    use std::sync::Arc;

    fn event() -> Arc<RecordType> {
        RecordType::builder("Event")
            .field(FieldSpec::new("label", Candidate::string()))
            .field(FieldSpec::new("at", Candidate::datetime()).format("unix"))
            .field(FieldSpec::new("note", Candidate::string()).optional())
            .build()
            .unwrap()
    }

    #[test]
    fn test_stringify_temporal_and_enum() {
        let status = EnumType::backed("Status", &[("ACTIVE", "a")]);
        let t = RecordType::builder("S")
            .field(FieldSpec::new("status", Candidate::enumeration(&status)))
            .field(FieldSpec::new("day", Candidate::date()).format("d.m.Y"))
            .build()
            .unwrap();
        let r = parse(
            &t,
            Value::from(json!({"status": "ACTIVE", "day": "02.03.2024"})),
            &ParseOptions::default().convert(true),
        )
        .unwrap();

        let plain = dump(&r, &DumpOptions::default().stringify(true)).unwrap();
        assert_eq!(plain["status"], Value::from("a"));
        assert_eq!(plain["day"], Value::from("02.03.2024"));

        let typed = dump(&r, &DumpOptions::default()).unwrap();
        assert!(typed["day"].is_temporal());
    }

    #[test]
    fn test_unix_format_dumps_epoch() {
        let r = parse(
            &event(),
            Value::from(json!({"label": "x", "at": 1_735_689_600})),
            &ParseOptions::default().convert(true),
        )
        .unwrap();
        let out = dump(&r, &DumpOptions::default().stringify(true)).unwrap();
        assert_eq!(out["at"], Value::Int(1_735_689_600));
    }

    #[test]
    fn test_skip_nulls() {
        let r = parse(
            &event(),
            Value::from(json!({"label": "x", "at": 0})),
            &ParseOptions::default().convert(true),
        )
        .unwrap();
        let out = dump(&r, &DumpOptions::default().skip_nulls(true)).unwrap();
        assert!(!out.contains_key("note"));
        assert!(dump(&r, &DumpOptions::default()).unwrap().contains_key("note"));
    }

    #[test]
    fn test_by_alias_uses_requested_group() {
        let t = RecordType::builder("G")
            .field(
                FieldSpec::new("date", Candidate::string())
                    .group("input", vec![MetadataEntry::alias("dt")])
                    .group("output", vec![MetadataEntry::alias("timestamp")]),
            )
            .build()
            .unwrap();
        let r = parse(&t, Value::from(json!({"date": "x"})), &ParseOptions::default()).unwrap();

        let keys = |group: &str| -> Vec<String> {
            dump(&r, &DumpOptions::default().group(group).by_alias(true))
                .unwrap()
                .keys()
                .cloned()
                .collect()
        };
        assert_eq!(keys("default"), vec!["date"]);
        assert_eq!(keys("input"), vec!["dt"]);
        assert_eq!(keys("output"), vec!["timestamp"]);
    }

    #[test]
    fn test_dump_hook_only_when_stringifying() {
        let t = RecordType::builder("Tags")
            .hook("dumpTags", |v| {
                let joined: Vec<String> = v
                    .elements()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect();
                Ok(Value::from(joined.join("|")))
            })
            .field(FieldSpec::new("tags", Candidate::array()).dump_with(Hook::named("dumpTags")))
            .field(FieldSpec::new("meta", Candidate::array()).dump_with(Hook::Json))
            .build()
            .unwrap();
        let r = parse(
            &t,
            Value::from(json!({"tags": ["a", "b"], "meta": {"k": 1}})),
            &ParseOptions::default(),
        )
        .unwrap();

        let out = dump(&r, &DumpOptions::default().stringify(true)).unwrap();
        assert_eq!(out["tags"], Value::from("a|b"));
        assert_eq!(out["meta"], Value::from(r#"{"k":1}"#));

        let raw = dump(&r, &DumpOptions::default()).unwrap();
        assert_eq!(raw["tags"], Value::from(json!(["a", "b"])));
    }

    #[test]
    fn test_nested_records_become_maps() {
        let ev = event();
        let day = RecordType::builder("Day")
            .field(FieldSpec::new("events", Candidate::list_of(Candidate::record(&ev))))
            .build()
            .unwrap();
        let r = parse(
            &day,
            Value::from(json!({"events": [{"label": "a", "at": 0}]})),
            &ParseOptions::default().convert(true),
        )
        .unwrap();
        let out = dump(&r, &DumpOptions::default().stringify(true)).unwrap();
        let first = out["events"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(first["label"], Value::from("a"));
        assert_eq!(first["at"], Value::Int(0));
    }

    #[test]
    fn test_ranges_dump_with_field_format() {
        let t = RecordType::builder("Booking")
            .field(FieldSpec::new("stay", Candidate::date_range()).format("d.m.Y"))
            .build()
            .unwrap();
        let r = parse(
            &t,
            Value::from(json!({"stay": "01.01.2025...07.01.2025"})),
            &ParseOptions::default().convert(true),
        )
        .unwrap();

        let plain = dump(&r, &DumpOptions::default().stringify(true)).unwrap();
        assert_eq!(plain["stay"], Value::from("01.01.2025...07.01.2025"));

        let typed = dump(&r, &DumpOptions::default()).unwrap();
        assert!(typed["stay"].as_range().is_some());
    }

    #[test]
    fn test_failing_dump_hook_is_a_dumping_error() {
        let t = RecordType::builder("Secret")
            .hook("refuse", |_| Err("not exportable".into()))
            .field(FieldSpec::new("token", Candidate::string()).dump_with(Hook::named("refuse")))
            .build()
            .unwrap();
        let r = parse(&t, Value::from(json!({"token": "t"})), &ParseOptions::default()).unwrap();

        let err = dump(&r, &DumpOptions::default().stringify(true)).unwrap_err();
        assert_eq!(err.code(), Some(crate::errors::ErrorCode::DumpHookFailed));
        assert!(!err.is_parsing());
        match err {
            crate::errors::Error::Dumping(e) => assert_eq!(e.path(), "token"),
            other => panic!("expected dumping error, got {:?}", other),
        }
    }
}
