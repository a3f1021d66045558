//! Validation engine
//!
//! Walks a parsed record in field declaration order, running each field's validator
//! chain for the requested group, then recursing into nested records and into every
//! record element of collection fields.
//!
//! # Modes
//!
//! - `Mode::Bool`: did every predicate pass
//! - `Mode::Throw`: `Error::Validation` carrying the failure map on any failure
//! - `Mode::FailureMap`: the full failure map
//!
//! With `stop_on_fail`, the whole walk (recursion included) ends at the first
//! failing predicate.

mod display;
mod failures;
mod validators;

pub use display::stringify;
pub use failures::{FieldFailures, ValidationFailures};

pub(crate) use failures::make_path;

use crate::errors::{Result, StructuralError, ValidationError};
use crate::observability::Event;
use crate::record::RecordInstance;
use crate::schema::{ResolvedGroups, DEFAULT_GROUP};
use crate::value::Value;

/// Result shape requested from a validation walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Bool,
    Throw,
    FailureMap,
}

/// Validation result
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed(bool),
    Failures(ValidationFailures),
}

/// Options for one validation walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    pub group: String,
    pub stop_on_fail: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            stop_on_fail: false,
        }
    }
}

impl ValidateOptions {
    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn stop_on_fail(mut self) -> Self {
        self.stop_on_fail = true;
        self
    }
}

/// Validates `instance` and shapes the result according to `mode`.
pub fn validate(instance: &RecordInstance, mode: Mode, options: &ValidateOptions) -> Result<Outcome> {
    let groups = instance.record_type().resolve(&options.group)?;
    let mut walk = Walk {
        group: &options.group,
        stop_on_fail: options.stop_on_fail,
        stopped: false,
    };
    let failures = walk.record(instance, groups)?;

    match mode {
        Mode::Bool => Ok(Outcome::Passed(failures.is_empty())),
        Mode::FailureMap => Ok(Outcome::Failures(failures)),
        Mode::Throw if failures.is_empty() => Ok(Outcome::Passed(true)),
        Mode::Throw => {
            let fields: Vec<&str> = failures.fields().collect();
            let field_list = fields.join(",");
            Event::ValidationFailed.emit(&[("record", instance.name()), ("fields", &field_list)]);
            Err(ValidationError::new(instance.name(), failures).into())
        }
    }
}

struct Walk<'a> {
    group: &'a str,
    stop_on_fail: bool,
    stopped: bool,
}

impl Walk<'_> {
    fn record(
        &mut self,
        instance: &RecordInstance,
        groups: &ResolvedGroups,
    ) -> std::result::Result<ValidationFailures, StructuralError> {
        let mut failures = ValidationFailures::default();

        for (index, spec) in instance.record_type().fields().iter().enumerate() {
            let value = instance.get(spec.name()).unwrap_or(&Value::Null);
            let mut field = FieldFailures::default();

            for kind in groups.field(index).validators() {
                if !validators::check(kind, value, instance) {
                    field.push_message(validators::message(kind, value));
                    if self.stop_on_fail {
                        self.stopped = true;
                        break;
                    }
                }
            }

            if !self.stopped {
                self.descend(value, &mut field)?;
            }

            failures.insert(spec.name(), field);
            if self.stopped {
                break;
            }
        }

        Ok(failures)
    }

    fn descend(
        &mut self,
        value: &Value,
        field: &mut FieldFailures,
    ) -> std::result::Result<(), StructuralError> {
        match value {
            Value::Record(nested) => {
                let groups = nested.record_type().resolve_nested(self.group)?;
                let inner = self.record(nested, groups)?;
                field.set_nested(inner);
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.element(i.to_string(), item, field)?;
                    if self.stopped {
                        break;
                    }
                }
            }
            Value::Map(map) => {
                for (key, item) in map {
                    self.element(key.clone(), item, field)?;
                    if self.stopped {
                        break;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn element(
        &mut self,
        key: String,
        item: &Value,
        field: &mut FieldFailures,
    ) -> std::result::Result<(), StructuralError> {
        if let Value::Record(element) = item {
            let groups = element.record_type().resolve_nested(self.group)?;
            let inner = self.record(element, groups)?;
            field.insert_element(key, inner);
        }
        Ok(())
    }
}
