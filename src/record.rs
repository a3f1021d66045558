//! Record instances and the record-level entry points
//!
//! `RecordInstance` holds concrete field values in declaration order plus a shared
//! handle to its `RecordType`. Entry points that create instances live on
//! `RecordType` and take `&Arc<RecordType>` so every instance can keep the handle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::batch::{self, RowValidation, Rows};
use crate::binding::{self, FieldSource};
use crate::codec::{env, json, query, snapshot, JsonOptions, QueryOptions};
use crate::dump::{self, DumpOptions};
use crate::errors::Result;
use crate::parse::{self, ParseOptions};
use crate::schema::RecordType;
use crate::validate::{self, Mode, Outcome, ValidateOptions, ValidationFailures};
use crate::value::{Value, ValueMap};

/// A parsed record.
#[derive(Clone)]
pub struct RecordInstance {
    record_type: Arc<RecordType>,
    fields: ValueMap,
}

impl RecordInstance {
    pub(crate) fn new(record_type: Arc<RecordType>, fields: ValueMap) -> Self {
        Self { record_type, fields }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    /// Name of the record type
    pub fn name(&self) -> &str {
        self.record_type.name()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field values keyed by canonical name, in declaration order
    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn into_fields(self) -> ValueMap {
        self.fields
    }

    /// Dumps the record into an ordered map
    pub fn dump(&self, options: &DumpOptions) -> Result<ValueMap> {
        dump::dump(self, options)
    }

    /// Plain map: canonical names, typed values kept
    pub fn to_map(&self) -> Result<ValueMap> {
        self.dump(&DumpOptions::default())
    }

    pub fn to_json(&self, options: &JsonOptions) -> Result<String> {
        json::render(self, options)
    }

    pub fn to_query(&self, options: &QueryOptions) -> Result<String> {
        query::render(self, options)
    }

    /// Writes the record to `path` so `RecordType::read_snapshot` can restore it
    pub fn write_snapshot(&self, path: &Path, group: &str) -> Result<()> {
        snapshot::write(self, path, group)
    }

    /// Field values for foreign binding, optionally keyed by alias
    pub fn field_map(&self, group: &str, by_alias: bool) -> Result<ValueMap> {
        binding::extract_field_map(self, group, by_alias)
    }

    /// Copy with some fields replaced. With `options.by_alias`, current values are
    /// keyed by alias and `updates` is expected to use aliases as well.
    pub fn update(&self, updates: ValueMap, options: &ParseOptions) -> Result<RecordInstance> {
        let mut merged = self.field_map(&options.group, options.by_alias)?;
        merged.extend(updates);
        self.record_type.parse(Value::Map(merged), options)
    }

    pub fn validate(&self, mode: Mode, options: &ValidateOptions) -> Result<Outcome> {
        validate::validate(self, mode, options)
    }

    pub fn is_valid(&self, options: &ValidateOptions) -> Result<bool> {
        match self.validate(Mode::Bool, options)? {
            Outcome::Passed(passed) => Ok(passed),
            Outcome::Failures(failures) => Ok(failures.is_empty()),
        }
    }

    pub fn failures(&self, options: &ValidateOptions) -> Result<ValidationFailures> {
        match self.validate(Mode::FailureMap, options)? {
            Outcome::Failures(failures) => Ok(failures),
            Outcome::Passed(_) => Ok(ValidationFailures::default()),
        }
    }

    /// Fails with `Error::Validation` if any predicate fails
    pub fn ensure_valid(&self, options: &ValidateOptions) -> Result<()> {
        self.validate(Mode::Throw, options).map(|_| ())
    }
}

impl PartialEq for RecordInstance {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.fields == other.fields
    }
}

impl fmt::Debug for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name())?;
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl fmt::Display for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = JsonOptions {
            pretty: true,
            by_alias: false,
            ..JsonOptions::default()
        };
        let rendered = json::render(self, &options).map_err(|_| fmt::Error)?;
        write!(f, "{}{}", self.name(), rendered)
    }
}

impl RecordType {
    /// Parses a raw value (map, positional list, or record).
    pub fn parse(self: &Arc<Self>, raw: impl Into<Value>, options: &ParseOptions) -> Result<RecordInstance> {
        parse::parse(self, raw.into(), options)
    }

    pub fn from_json(self: &Arc<Self>, text: &str, options: &ParseOptions) -> Result<RecordInstance> {
        json::parse(self, text, &ValueMap::new(), options)
    }

    /// Parses JSON, letting `extra` override decoded keys
    pub fn from_json_with(
        self: &Arc<Self>,
        text: &str,
        extra: &ValueMap,
        options: &ParseOptions,
    ) -> Result<RecordInstance> {
        json::parse(self, text, extra, options)
    }

    pub fn from_query(self: &Arc<Self>, text: &str, options: &ParseOptions) -> Result<RecordInstance> {
        query::parse(self, text, &ValueMap::new(), options)
    }

    /// Parses a query string, letting `extra` override decoded keys
    pub fn from_query_with(
        self: &Arc<Self>,
        text: &str,
        extra: &ValueMap,
        options: &ParseOptions,
    ) -> Result<RecordInstance> {
        query::parse(self, text, extra, options)
    }

    /// Reads one variable per field from the process environment
    pub fn from_env(self: &Arc<Self>, options: &ParseOptions) -> Result<RecordInstance> {
        env::parse(self, std::env::vars(), &ValueMap::new(), options)
    }

    /// Same as `from_env`, over explicit `(name, value)` pairs
    pub fn from_env_snapshot<I>(self: &Arc<Self>, vars: I, options: &ParseOptions) -> Result<RecordInstance>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        env::parse(self, vars, &ValueMap::new(), options)
    }

    /// Reads fields from a host object and parses them
    pub fn from_object<S: FieldSource + ?Sized>(
        self: &Arc<Self>,
        source: &S,
        extra: &ValueMap,
        options: &ParseOptions,
    ) -> Result<RecordInstance> {
        let names = self.field_names(options.by_alias, &options.group)?;
        let raw = binding::read_object(source, &names, extra);
        let options = options.clone().convert(true);
        self.parse(Value::Map(raw), &options)
    }

    pub fn read_snapshot(self: &Arc<Self>, path: &Path, group: &str) -> Result<RecordInstance> {
        snapshot::read(self, path, group)
    }

    /// Parses many rows, keeping their keys (list positions become "0", "1", ...)
    pub fn parse_many(
        self: &Arc<Self>,
        rows: Value,
        mode: RowValidation,
        options: &ParseOptions,
    ) -> Result<Rows> {
        batch::parse_many(self, rows, mode, options)
    }

    /// Parses a JSON array or object of rows
    pub fn parse_many_json(
        self: &Arc<Self>,
        text: &str,
        mode: RowValidation,
        options: &ParseOptions,
    ) -> Result<Rows> {
        let rows = json::decode(text)?;
        batch::parse_many(self, rows, mode, options)
    }

    /// Field names in declaration order, optionally replaced by their aliases
    pub fn field_names(&self, by_alias: bool, group: &str) -> Result<Vec<String>> {
        let groups = self.resolve(group)?;
        Ok(self
            .fields()
            .iter()
            .enumerate()
            .map(|(i, spec)| match groups.field(i).alias() {
                Some(alias) if by_alias => alias.to_string(),
                _ => spec.name().to_string(),
            })
            .collect())
    }
}
