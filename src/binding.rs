//! Foreign object binding
//!
//! Host objects take part through explicit capability traits:
//! - `FieldSource`: read properties, getters and virtual properties
//! - `FieldTarget`: write through setters, properties and virtual properties
//! - `Constructible`: build from named constructor arguments
//!
//! Reading priority: properties, then getters override, then caller extras, then
//! virtual properties for names still missing. Writing priority per field:
//! constructor argument, setter, property, virtual property; unmatched fields are
//! skipped.

use thiserror::Error;

use crate::errors::Result;
use crate::observability::Event;
use crate::record::RecordInstance;
use crate::value::{Value, ValueMap};

#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing constructor argument '{0}'")]
    MissingArgument(String),

    #[error("field '{field}' rejected: {reason}")]
    Rejected { field: String, reason: String },

    #[error("cannot construct {target}: {reason}")]
    Construction { target: String, reason: String },
}

impl BindError {
    pub fn rejected(field: &str, reason: impl Into<String>) -> Self {
        BindError::Rejected {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A host object fields can be read from.
pub trait FieldSource {
    /// Public properties
    fn properties(&self) -> ValueMap {
        ValueMap::new()
    }

    /// Value of the getter for `name`, if the object has one
    fn getter(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Computed property looked up for names found nowhere else
    fn virtual_property(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A host object fields can be written to.
pub trait FieldTarget {
    /// Writes through a setter. `Ok(false)` if the object has no setter for `name`.
    fn set(&mut self, _name: &str, _value: &Value) -> std::result::Result<bool, BindError> {
        Ok(false)
    }

    fn has_property(&self, _name: &str) -> bool {
        false
    }

    fn set_property(&mut self, name: &str, _value: Value) -> std::result::Result<(), BindError> {
        Err(BindError::rejected(name, "no such property"))
    }

    /// Writes a computed property. `Ok(false)` if not supported.
    fn set_virtual(&mut self, _name: &str, _value: Value) -> std::result::Result<bool, BindError> {
        Ok(false)
    }
}

/// A host type built from named constructor arguments.
pub trait Constructible: FieldTarget + Sized {
    /// Constructor parameter names in order
    fn constructor_params() -> Vec<String>;

    fn construct(args: ConstructorArgs) -> std::result::Result<Self, BindError>;
}

/// Named constructor arguments, in parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructorArgs {
    values: ValueMap,
}

impl ConstructorArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Removes and returns an argument, failing if it was not supplied
    pub fn take(&mut self, name: &str) -> std::result::Result<Value, BindError> {
        self.values
            .shift_remove(name)
            .ok_or_else(|| BindError::MissingArgument(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Field values of `instance`, keyed by alias for `group` when `by_alias` is set.
///
/// Values are not stringified: nested records stay records, dates stay dates.
pub fn extract_field_map(instance: &RecordInstance, group: &str, by_alias: bool) -> Result<ValueMap> {
    if !by_alias {
        return Ok(instance.fields().clone());
    }

    let groups = instance.record_type().resolve(group)?;
    Ok(instance
        .record_type()
        .fields()
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let key = groups.field(i).alias().unwrap_or(spec.name());
            let value = instance.get(spec.name()).cloned().unwrap_or(Value::Null);
            (key.to_string(), value)
        })
        .collect())
}

/// Writes `fields` into `target` through its setters, properties and virtual
/// properties, in that order. Fields no channel accepts are skipped.
pub fn apply_field_map<T: FieldTarget + ?Sized>(
    target: &mut T,
    fields: ValueMap,
) -> std::result::Result<(), BindError> {
    for (name, value) in fields {
        if target.set(&name, &value)? {
            continue;
        }
        if target.has_property(&name) {
            target.set_property(&name, value)?;
            continue;
        }
        if !target.set_virtual(&name, value)? {
            Event::BindingSkipped.emit(&[("field", &name)]);
        }
    }
    Ok(())
}

/// Builds a host object from `instance`: constructor arguments first, the rest
/// through `apply_field_map`. `extra` overrides record values.
pub fn build_object<T: Constructible>(
    instance: &RecordInstance,
    extra: &ValueMap,
    group: &str,
    by_alias: bool,
) -> Result<T> {
    let mut fields = extract_field_map(instance, group, by_alias)?;
    fields.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut args = ConstructorArgs::default();
    for param in T::constructor_params() {
        if let Some(value) = fields.shift_remove(&param) {
            args.values.insert(param, value);
        }
    }

    let mut object = T::construct(args)?;
    apply_field_map(&mut object, fields)?;
    Ok(object)
}

/// Reads the raw values for `names` from `source`.
pub fn read_object<S: FieldSource + ?Sized>(source: &S, names: &[String], extra: &ValueMap) -> ValueMap {
    let mut values: ValueMap = source
        .properties()
        .into_iter()
        .filter(|(k, _)| names.contains(k))
        .collect();

    for name in names {
        if let Some(value) = source.getter(name) {
            values.insert(name.clone(), value);
        }
    }

    values.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

    for name in names {
        if values.contains_key(name) {
            continue;
        }
        if let Some(value) = source.virtual_property(name) {
            values.insert(name.clone(), value);
        }
    }

    values
}
