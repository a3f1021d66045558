//! Field and record type definitions
//!
//! A `RecordType` is declared once with `RecordType::builder` and is immutable
//! afterwards. Building validates the declaration and resolves every declared group.
//!
//! Candidate types of a field form an ordered union: the parser tries them in
//! declaration order and keeps the first that accepts the value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config;
use crate::errors::{HookError, StructuralError};
use crate::observability::Event;
use crate::record::RecordInstance;
use crate::schema::group::{declared_names, ResolvedGroups, DEFAULT_GROUP};
use crate::schema::metadata::{
    Hook, HookFn, MetadataEntry, Predicate, PredicateFn, ValidatorKind,
};
use crate::value::{EnumBacking, EnumValue, Value};

/// Scalar and untyped candidate kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    String,
    /// Untyped collection (list or map)
    Array,
    Null,
    /// Accepts any value unchanged
    Any,
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Array => "array",
            Primitive::Null => "null",
            Primitive::Any => "any",
        }
    }
}

/// Date and time kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
}

impl TemporalKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::DateTime => "datetime",
            TemporalKind::Time => "time",
        }
    }

    /// Name of the range type over this kind
    pub fn range_name(&self) -> &'static str {
        match self {
            TemporalKind::Date => "DateRange",
            TemporalKind::DateTime => "DateTimeRange",
            TemporalKind::Time => "TimeRange",
        }
    }

    /// True if `value` is already a temporal value of this kind
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (TemporalKind::Date, Value::Date(_))
                | (TemporalKind::DateTime, Value::DateTime(_))
                | (TemporalKind::Time, Value::Time(_))
        )
    }
}

/// One case of an enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    name: String,
    backing: Option<EnumBacking>,
}

impl EnumCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backing(&self) -> Option<&EnumBacking> {
        self.backing.as_ref()
    }
}

/// An enum type: ordered cases, optionally backed by strings or integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    cases: Vec<EnumCase>,
}

impl EnumType {
    /// Enum whose cases carry no backing value
    pub fn pure(name: &str, cases: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            cases: cases
                .iter()
                .map(|c| EnumCase {
                    name: c.to_string(),
                    backing: None,
                })
                .collect(),
        })
    }

    /// Enum backed by string values
    pub fn backed(name: &str, cases: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            cases: cases
                .iter()
                .map(|(c, v)| EnumCase {
                    name: c.to_string(),
                    backing: Some(EnumBacking::Str(v.to_string())),
                })
                .collect(),
        })
    }

    /// Enum backed by integer values
    pub fn backed_int(name: &str, cases: &[(&str, i64)]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            cases: cases
                .iter()
                .map(|(c, v)| EnumCase {
                    name: c.to_string(),
                    backing: Some(EnumBacking::Int(*v)),
                })
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[EnumCase] {
        &self.cases
    }

    fn materialize(&self, case: &EnumCase) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            case: case.name.clone(),
            backing: case.backing.clone(),
        }
    }

    /// The case called `name`
    pub fn case(&self, name: &str) -> Option<EnumValue> {
        self.cases
            .iter()
            .find(|c| c.name == name)
            .map(|c| self.materialize(c))
    }

    /// Coerces a raw value: backing value first, then case name. Pure enums also accept
    /// an ordinal index.
    pub fn coerce(&self, raw: &Value) -> Option<EnumValue> {
        if let Value::Enum(e) = raw {
            return (e.enum_name == self.name).then(|| e.clone());
        }

        let by_backing = self.cases.iter().find(|c| match (&c.backing, raw) {
            (Some(EnumBacking::Str(b)), Value::String(s)) => b == s,
            (Some(EnumBacking::Int(b)), Value::Int(i)) => b == i,
            (Some(EnumBacking::Int(b)), Value::String(s)) => s.trim().parse::<i64>().ok() == Some(*b),
            _ => false,
        });
        if let Some(case) = by_backing {
            return Some(self.materialize(case));
        }

        if let Some(found) = raw.as_str().and_then(|s| self.case(s)) {
            return Some(found);
        }

        if self.cases.iter().any(|c| c.backing.is_some()) {
            return None;
        }
        let ordinal = match raw {
            Value::Int(i) => usize::try_from(*i).ok(),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        }?;
        self.cases.get(ordinal).map(|c| self.materialize(c))
    }
}

/// One member of a field's candidate union.
#[derive(Debug, Clone)]
pub enum Candidate {
    Primitive(Primitive),
    Enum(Arc<EnumType>),
    Temporal(TemporalKind),
    /// `start...finish` period over a temporal kind
    Range(TemporalKind),
    Record(Arc<RecordType>),
    /// Homogeneous collection whose elements are parsed with the inner candidate
    ListOf(Box<Candidate>),
}

impl Candidate {
    pub fn bool() -> Self {
        Candidate::Primitive(Primitive::Bool)
    }

    pub fn int() -> Self {
        Candidate::Primitive(Primitive::Int)
    }

    pub fn float() -> Self {
        Candidate::Primitive(Primitive::Float)
    }

    pub fn string() -> Self {
        Candidate::Primitive(Primitive::String)
    }

    pub fn array() -> Self {
        Candidate::Primitive(Primitive::Array)
    }

    pub fn null() -> Self {
        Candidate::Primitive(Primitive::Null)
    }

    pub fn any() -> Self {
        Candidate::Primitive(Primitive::Any)
    }

    pub fn date() -> Self {
        Candidate::Temporal(TemporalKind::Date)
    }

    pub fn datetime() -> Self {
        Candidate::Temporal(TemporalKind::DateTime)
    }

    pub fn time() -> Self {
        Candidate::Temporal(TemporalKind::Time)
    }

    pub fn date_range() -> Self {
        Candidate::Range(TemporalKind::Date)
    }

    pub fn datetime_range() -> Self {
        Candidate::Range(TemporalKind::DateTime)
    }

    pub fn time_range() -> Self {
        Candidate::Range(TemporalKind::Time)
    }

    pub fn enumeration(enum_type: &Arc<EnumType>) -> Self {
        Candidate::Enum(Arc::clone(enum_type))
    }

    pub fn record(record_type: &Arc<RecordType>) -> Self {
        Candidate::Record(Arc::clone(record_type))
    }

    pub fn list_of(inner: Candidate) -> Self {
        Candidate::ListOf(Box::new(inner))
    }

    /// Human-readable type name, e.g. `list<Tag>`
    pub fn type_name(&self) -> String {
        match self {
            Candidate::Primitive(p) => p.type_name().to_string(),
            Candidate::Enum(e) => e.name().to_string(),
            Candidate::Temporal(t) => t.type_name().to_string(),
            Candidate::Range(t) => t.range_name().to_string(),
            Candidate::Record(r) => r.name().to_string(),
            Candidate::ListOf(inner) => format!("list<{}>", inner.type_name()),
        }
    }

    fn admits_null(&self) -> bool {
        matches!(
            self,
            Candidate::Primitive(Primitive::Null) | Candidate::Primitive(Primitive::Any)
        )
    }
}

/// Declaration of one record field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    candidates: Vec<Candidate>,
    default: Option<Value>,
    entries: Vec<MetadataEntry>,
}

impl FieldSpec {
    /// Required field with a single candidate type
    pub fn new(name: &str, candidate: Candidate) -> Self {
        Self {
            name: name.to_string(),
            candidates: vec![candidate],
            default: None,
            entries: Vec::new(),
        }
    }

    /// Appends a union candidate, tried after the ones declared before it
    pub fn or(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Makes the field optional with the given default
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Makes the field optional with a null default
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    /// Attaches an ungrouped metadata entry
    pub fn with(mut self, entry: MetadataEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn alias(self, alias: &str) -> Self {
        self.with(MetadataEntry::alias(alias))
    }

    pub fn format(self, pattern: &str) -> Self {
        self.with(MetadataEntry::format(pattern))
    }

    pub fn validate(self, kind: ValidatorKind) -> Self {
        self.with(MetadataEntry::Validator(kind))
    }

    pub fn propagate(self) -> Self {
        self.with(MetadataEntry::Propagate)
    }

    pub fn element_type(self, record_type: &Arc<RecordType>) -> Self {
        self.with(MetadataEntry::ElementType(Arc::clone(record_type)))
    }

    pub fn parse_with(self, hook: Hook) -> Self {
        self.with(MetadataEntry::ParseHook(hook))
    }

    pub fn dump_with(self, hook: Hook) -> Self {
        self.with(MetadataEntry::DumpHook(hook))
    }

    /// Attaches entries that apply only to the named group
    pub fn group(self, name: &str, entries: Vec<MetadataEntry>) -> Self {
        self.with(MetadataEntry::group(name, entries))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// True if null is kept as-is: a `null`/`any` candidate or a null default
    pub fn admits_null(&self) -> bool {
        self.candidates.iter().any(Candidate::admits_null)
            || matches!(self.default, Some(Value::Null))
    }

    /// Human-readable union, e.g. `float|Status`
    pub fn type_name(&self) -> String {
        self.candidates
            .iter()
            .map(Candidate::type_name)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// An immutable record type.
pub struct RecordType {
    name: String,
    fields: Vec<FieldSpec>,
    entries: Vec<MetadataEntry>,
    hooks: HashMap<String, HookFn>,
    predicates: HashMap<String, PredicateFn>,
    groups: HashMap<String, ResolvedGroups>,
    /// Every resolvable group name, `default` first
    declared: Vec<String>,
    empty: ResolvedGroups,
}

impl RecordType {
    pub fn builder(name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.to_string(),
            fields: Vec::new(),
            entries: Vec::new(),
            hooks: HashMap::new(),
            predicates: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Schema-level entries
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn declared_groups(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    pub fn declares_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Resolved groups for `group`; unknown names are a structural error.
    pub fn resolve(&self, group: &str) -> Result<&ResolvedGroups, StructuralError> {
        self.groups
            .get(group)
            .ok_or_else(|| StructuralError::unknown_group(&self.name, group))
    }

    /// Resolution used when recursing from a parent type: a group this type never
    /// declares resolves to empty groups unless strict nested groups are configured.
    pub fn resolve_nested(&self, group: &str) -> Result<&ResolvedGroups, StructuralError> {
        match self.groups.get(group) {
            Some(resolved) => Ok(resolved),
            None if config::current().strict_nested_groups => {
                Err(StructuralError::unknown_group(&self.name, group))
            }
            None => Ok(&self.empty),
        }
    }

    /// Registered hook method
    pub fn hook(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name)
    }

    /// Registered predicate method
    pub fn predicate(&self, name: &str) -> Option<&PredicateFn> {
        self.predicates.get(name)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(FieldSpec::name).collect::<Vec<_>>(),
            )
            .field("groups", &self.declared)
            .finish()
    }
}

/// Builder for `RecordType`.
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    entries: Vec<MetadataEntry>,
    hooks: HashMap<String, HookFn>,
    predicates: HashMap<String, PredicateFn>,
}

impl RecordTypeBuilder {
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Attaches a schema-level entry
    pub fn with(mut self, entry: MetadataEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Schema-level date-time format for the default group
    pub fn format(self, pattern: &str) -> Self {
        self.with(MetadataEntry::format(pattern))
    }

    /// Schema-level entries for the named group
    pub fn group(self, name: &str, entries: Vec<MetadataEntry>) -> Self {
        self.with(MetadataEntry::group(name, entries))
    }

    /// Registers a hook method referenced by `Hook::Named`
    pub fn hook<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.hooks.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Registers a predicate method referenced by `Predicate::Named`
    pub fn predicate<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Value, &RecordInstance) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Validates the declaration and resolves every declared group.
    pub fn build(self) -> Result<Arc<RecordType>, StructuralError> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StructuralError::duplicate_field(&self.name, &field.name));
            }
        }

        self.check_entries(None, &self.entries, false)?;
        for field in &self.fields {
            self.check_entries(Some(&field.name), &field.entries, false)?;
        }

        let mut declared = vec![DEFAULT_GROUP.to_string()];
        let names = declared_names(&self.entries)
            .chain(self.fields.iter().flat_map(|f| declared_names(&f.entries)));
        for name in names {
            if !declared.iter().any(|d| d == name) {
                declared.push(name.to_string());
            }
        }

        let mut groups = HashMap::with_capacity(declared.len());
        for group in &declared {
            let resolved = ResolvedGroups::resolve(&self.name, &self.entries, &self.fields, group)?;
            groups.insert(group.clone(), resolved);
        }

        let empty = ResolvedGroups::empty("", &self.fields);
        let field_count = self.fields.len().to_string();
        let group_list = declared.join(",");
        Event::RecordTypeBuilt.emit(&[
            ("record", &self.name),
            ("fields", &field_count),
            ("groups", &group_list),
        ]);

        Ok(Arc::new(RecordType {
            name: self.name,
            fields: self.fields,
            entries: self.entries,
            hooks: self.hooks,
            predicates: self.predicates,
            groups,
            declared,
            empty,
        }))
    }

    fn check_entries(
        &self,
        field: Option<&str>,
        entries: &[MetadataEntry],
        nested: bool,
    ) -> Result<(), StructuralError> {
        for entry in entries {
            match entry {
                MetadataEntry::Group { name, entries } => {
                    if nested {
                        return Err(StructuralError::invalid_declaration(
                            &self.name,
                            field,
                            format!("group '{}' is declared inside another group", name),
                        ));
                    }
                    if name.trim().is_empty() {
                        return Err(StructuralError::invalid_declaration(
                            &self.name,
                            field,
                            "group name must not be empty",
                        ));
                    }
                    self.check_entries(field, entries, true)?;
                }
                MetadataEntry::ParseHook(Hook::Named(name))
                | MetadataEntry::DumpHook(Hook::Named(name)) => {
                    if !self.hooks.contains_key(name) {
                        return Err(StructuralError::missing_hook(&self.name, field, name));
                    }
                }
                MetadataEntry::Validator(ValidatorKind::Custom {
                    predicate: Predicate::Named(name),
                    ..
                }) => {
                    if !self.predicates.contains_key(name) {
                        return Err(StructuralError::missing_hook(&self.name, field, name));
                    }
                }
                MetadataEntry::Alias(alias) if alias.is_empty() => {
                    return Err(StructuralError::invalid_declaration(
                        &self.name,
                        field,
                        "alias must not be empty",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn status() -> Arc<EnumType> {
        EnumType::backed(
            "Status",
            &[("ACTIVE", "a"), ("BANNED", "b"), ("CANCELED", "c"), ("DELETED", "d")],
        )
    }

    #[test]
    fn test_enum_coerce_precedence() {
        let status = status();
        assert_eq!(status.coerce(&Value::from("b")).unwrap().case, "BANNED");
        assert_eq!(status.coerce(&Value::from("ACTIVE")).unwrap().case, "ACTIVE");
        assert!(status.coerce(&Value::from("X")).is_none());
    }

    #[test]
    fn test_backed_enum_has_no_ordinal_fallback() {
        let status = status();
        assert!(status.coerce(&Value::Int(1)).is_none());
        assert!(status.coerce(&Value::from("3")).is_none());

        let level = EnumType::backed_int("Level", &[("LOW", 10), ("HIGH", 20)]);
        assert!(level.coerce(&Value::Int(1)).is_none());
        assert_eq!(level.coerce(&Value::Int(20)).unwrap().case, "HIGH");
    }

    #[test]
    fn test_int_backed_enum_prefers_backing_over_ordinal() {
        let level = EnumType::backed_int("Level", &[("LOW", 1), ("HIGH", 0)]);
        assert_eq!(level.coerce(&Value::Int(0)).unwrap().case, "HIGH");
        assert_eq!(level.coerce(&Value::from("1")).unwrap().case, "LOW");
    }

    #[test]
    fn test_pure_enum_coerce_by_name_and_ordinal() {
        let day = EnumType::pure("Daytime", &["MORNING", "EVENING"]);
        assert_eq!(day.coerce(&Value::from("EVENING")).unwrap().case, "EVENING");
        assert_eq!(day.coerce(&Value::Int(0)).unwrap().case, "MORNING");
        assert_eq!(day.coerce(&Value::from("1")).unwrap().case, "EVENING");
        assert!(day.coerce(&Value::Int(2)).is_none());
        assert!(day.coerce(&Value::from("evening")).is_none());
    }

    #[test]
    fn test_admits_null() {
        assert!(FieldSpec::new("a", Candidate::int()).or(Candidate::null()).admits_null());
        assert!(FieldSpec::new("a", Candidate::int()).optional().admits_null());
        assert!(!FieldSpec::new("a", Candidate::int()).with_default(3).admits_null());
    }

    #[test]
    fn test_build_rejects_duplicate_field() {
        let err = RecordType::builder("Dup")
            .field(FieldSpec::new("a", Candidate::int()))
            .field(FieldSpec::new("a", Candidate::string()))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateField);
    }

    #[test]
    fn test_build_rejects_unregistered_hook() {
        let err = RecordType::builder("Tags")
            .field(FieldSpec::new("tags", Candidate::array()).parse_with(Hook::named("parseTags")))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingHook);
        assert_eq!(err.field(), Some("tags"));
    }

    #[test]
    fn test_build_rejects_unregistered_predicate() {
        let err = RecordType::builder("V")
            .field(FieldSpec::new("v", Candidate::string()).validate(ValidatorKind::custom("isNumeric", None)))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingHook);
    }

    #[test]
    fn test_build_rejects_nested_group() {
        let err = RecordType::builder("G")
            .field(FieldSpec::new("a", Candidate::int()).group(
                "input",
                vec![MetadataEntry::group("inner", vec![])],
            ))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDeclaration);
    }

    #[test]
    fn test_build_rejects_duplicate_alias_in_group() {
        let err = RecordType::builder("G")
            .field(FieldSpec::new("a", Candidate::int()).group(
                "input",
                vec![MetadataEntry::alias("x"), MetadataEntry::alias("y")],
            ))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateMetadata);
    }

    #[test]
    fn test_groups_declared_and_resolved() {
        let t = RecordType::builder("S")
            .field(
                FieldSpec::new("date", Candidate::datetime())
                    .group("input", vec![MetadataEntry::alias("dt")])
                    .group("output", vec![MetadataEntry::alias("timestamp")]),
            )
            .build()
            .unwrap();
        let groups: Vec<_> = t.declared_groups().collect();
        assert_eq!(groups, vec!["default", "input", "output"]);
        assert_eq!(t.resolve("input").unwrap().field(0).alias(), Some("dt"));
        assert!(t.resolve("default").unwrap().field(0).alias().is_none());
        assert_eq!(
            t.resolve("missing").unwrap_err().code(),
            ErrorCode::UnknownGroup
        );
        assert!(t.resolve_nested("missing").is_ok());
    }

    #[test]
    fn test_candidate_type_names() {
        let tag = RecordType::builder("Tag")
            .field(FieldSpec::new("name", Candidate::string()))
            .build()
            .unwrap();
        let spec = FieldSpec::new("tags", Candidate::list_of(Candidate::record(&tag)))
            .or(Candidate::null());
        assert_eq!(spec.type_name(), "list<Tag>|null");
    }
}
