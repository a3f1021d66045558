//! Declarative metadata attached to fields and record types

use std::fmt;
use std::sync::Arc;

use crate::errors::HookError;
use crate::observability::Event;
use crate::record::RecordInstance;
use crate::schema::types::RecordType;
use crate::value::Value;

/// Custom converter: raw value in, converted value out.
pub type HookFn = Arc<dyn Fn(&Value) -> Result<Value, HookError> + Send + Sync>;

/// Custom validation predicate: field value and the owning instance.
pub type PredicateFn = Arc<dyn Fn(&Value, &RecordInstance) -> bool + Send + Sync>;

/// Reference to a parse or dump converter.
#[derive(Clone)]
pub enum Hook {
    /// Built-in JSON codec: decode a JSON string on parse, encode to a JSON string on dump
    Json,
    /// Method registered on the owning record type
    Named(String),
    /// Inline function
    Func(HookFn),
}

impl Hook {
    pub fn named(name: &str) -> Self {
        Hook::Named(name.to_string())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        Hook::Func(Arc::new(f))
    }

    /// Name used in logs and error messages
    pub fn label(&self) -> &str {
        match self {
            Hook::Json => "json",
            Hook::Named(name) => name,
            Hook::Func(_) => "<fn>",
        }
    }

    /// Runs the hook; named hooks are looked up on `owner`.
    pub(crate) fn apply(
        &self,
        owner: &RecordType,
        direction: Direction,
        value: &Value,
    ) -> Result<Value, HookError> {
        let event = match direction {
            Direction::Parse => Event::ParseHookInvoked,
            Direction::Dump => Event::DumpHookInvoked,
        };
        event.emit(&[("record", owner.name()), ("hook", self.label())]);

        match self {
            Hook::Json => match direction {
                Direction::Parse => json_decode(value),
                Direction::Dump => Ok(Value::String(serde_json::to_string(value)?)),
            },
            Hook::Named(name) => {
                let f = owner
                    .hook(name)
                    .ok_or_else(|| HookError::from(format!("no method named '{}'", name)))?;
                f(value)
            }
            Hook::Func(f) => f(value),
        }
    }
}

/// Which way a hook converts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Parse,
    Dump,
}

/// Strings are decoded; anything else is taken as already decoded.
fn json_decode(value: &Value) -> Result<Value, HookError> {
    match value {
        Value::String(s) => Ok(Value::from(serde_json::from_str::<serde_json::Value>(s)?)),
        other => Ok(other.clone()),
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Json => write!(f, "Hook::Json"),
            Hook::Named(name) => write!(f, "Hook::Named({:?})", name),
            Hook::Func(_) => write!(f, "Hook::Func"),
        }
    }
}

/// Reference to a custom validation predicate.
#[derive(Clone)]
pub enum Predicate {
    /// Predicate registered on the owning record type
    Named(String),
    /// Inline predicate; `label` names it in default failure messages
    Func { label: String, f: PredicateFn },
}

impl Predicate {
    pub fn named(name: &str) -> Self {
        Predicate::Named(name.to_string())
    }

    pub fn func<F>(label: &str, f: F) -> Self
    where
        F: Fn(&Value, &RecordInstance) -> bool + Send + Sync + 'static,
    {
        Predicate::Func {
            label: label.to_string(),
            f: Arc::new(f),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Predicate::Named(name) => name,
            Predicate::Func { label, .. } => label,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({:?})", self.label())
    }
}

/// Built-in and custom validator kinds.
#[derive(Debug, Clone)]
pub enum ValidatorKind {
    /// Collection contains the element (string contains the substring)
    Contains(Value),
    /// Collection does not contain the element
    HasNo(Value),
    /// Value loosely equals the expected value
    Exactly(Value),
    GreaterThan { bound: Value, or_equal: bool },
    LowerThan { bound: Value, or_equal: bool },
    /// Element count of a collection or byte length of a string, both bounds inclusive
    Length { min: usize, max: usize },
    /// Not null, false, zero, `""`, `"0"` or an empty collection
    NotEmpty,
    NotNull,
    OneOf(Vec<Value>),
    NotIn(Vec<Value>),
    /// No element of the collection is itself a collection
    Plain,
    Custom {
        predicate: Predicate,
        message: Option<String>,
    },
}

impl ValidatorKind {
    pub fn greater_than(bound: impl Into<Value>) -> Self {
        ValidatorKind::GreaterThan {
            bound: bound.into(),
            or_equal: false,
        }
    }

    pub fn at_least(bound: impl Into<Value>) -> Self {
        ValidatorKind::GreaterThan {
            bound: bound.into(),
            or_equal: true,
        }
    }

    pub fn lower_than(bound: impl Into<Value>) -> Self {
        ValidatorKind::LowerThan {
            bound: bound.into(),
            or_equal: false,
        }
    }

    pub fn at_most(bound: impl Into<Value>) -> Self {
        ValidatorKind::LowerThan {
            bound: bound.into(),
            or_equal: true,
        }
    }

    pub fn length(min: usize, max: usize) -> Self {
        ValidatorKind::Length { min, max }
    }

    pub fn min_length(min: usize) -> Self {
        ValidatorKind::Length { min, max: usize::MAX }
    }

    pub fn max_length(max: usize) -> Self {
        ValidatorKind::Length { min: 0, max }
    }

    pub fn one_of<I, V>(set: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ValidatorKind::OneOf(set.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(set: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ValidatorKind::NotIn(set.into_iter().map(Into::into).collect())
    }

    /// Custom predicate registered on the record type under `name`.
    pub fn custom(name: &str, message: Option<&str>) -> Self {
        ValidatorKind::Custom {
            predicate: Predicate::named(name),
            message: message.map(str::to_string),
        }
    }

    pub fn custom_fn<F>(label: &str, message: Option<&str>, f: F) -> Self
    where
        F: Fn(&Value, &RecordInstance) -> bool + Send + Sync + 'static,
    {
        ValidatorKind::Custom {
            predicate: Predicate::func(label, f),
            message: message.map(str::to_string),
        }
    }
}

/// One declared metadata entry.
#[derive(Debug, Clone)]
pub enum MetadataEntry {
    Alias(String),
    Format(String),
    /// Collection elements are sub-records of this type
    ElementType(Arc<RecordType>),
    /// Field value is merged into the raw input of nested sub-records
    Propagate,
    ParseHook(Hook),
    DumpHook(Hook),
    Validator(ValidatorKind),
    /// Entries that apply only when resolving the named group
    Group {
        name: String,
        entries: Vec<MetadataEntry>,
    },
}

/// Kind of a single-occurrence entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Alias,
    Format,
    ElementType,
    Propagate,
    ParseHook,
    DumpHook,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Alias => "alias",
            EntryKind::Format => "format",
            EntryKind::ElementType => "element type",
            EntryKind::Propagate => "propagate",
            EntryKind::ParseHook => "parse hook",
            EntryKind::DumpHook => "dump hook",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetadataEntry {
    pub fn alias(name: &str) -> Self {
        MetadataEntry::Alias(name.to_string())
    }

    pub fn format(pattern: &str) -> Self {
        MetadataEntry::Format(pattern.to_string())
    }

    pub fn group(name: &str, entries: Vec<MetadataEntry>) -> Self {
        MetadataEntry::Group {
            name: name.to_string(),
            entries,
        }
    }

    /// Single-occurrence kind of this entry; `None` for validators and groups.
    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            MetadataEntry::Alias(_) => Some(EntryKind::Alias),
            MetadataEntry::Format(_) => Some(EntryKind::Format),
            MetadataEntry::ElementType(_) => Some(EntryKind::ElementType),
            MetadataEntry::Propagate => Some(EntryKind::Propagate),
            MetadataEntry::ParseHook(_) => Some(EntryKind::ParseHook),
            MetadataEntry::DumpHook(_) => Some(EntryKind::DumpHook),
            MetadataEntry::Validator(_) | MetadataEntry::Group { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_kinds() {
        assert_eq!(MetadataEntry::alias("dt").kind(), Some(EntryKind::Alias));
        assert_eq!(MetadataEntry::Propagate.kind(), Some(EntryKind::Propagate));
        assert_eq!(
            MetadataEntry::Validator(ValidatorKind::NotNull).kind(),
            None
        );
        assert_eq!(MetadataEntry::group("input", vec![]).kind(), None);
    }

    #[test]
    fn test_hook_labels() {
        assert_eq!(Hook::Json.label(), "json");
        assert_eq!(Hook::named("parseTags").label(), "parseTags");
        assert_eq!(Hook::func(|v| Ok(v.clone())).label(), "<fn>");
    }

    #[test]
    fn test_validator_constructors() {
        match ValidatorKind::at_least(17) {
            ValidatorKind::GreaterThan { bound, or_equal } => {
                assert_eq!(bound, Value::Int(17));
                assert!(or_equal);
            }
            other => panic!("unexpected {:?}", other),
        }
        match ValidatorKind::min_length(8) {
            ValidatorKind::Length { min, max } => {
                assert_eq!(min, 8);
                assert_eq!(max, usize::MAX);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
