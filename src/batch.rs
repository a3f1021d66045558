//! Parsing many rows at once

use indexmap::IndexMap;
use std::sync::Arc;

use crate::errors::{ParsingError, Result};
use crate::parse::{parse, ParseOptions};
use crate::record::RecordInstance;
use crate::schema::RecordType;
use crate::validate::{Mode, Outcome, ValidateOptions};
use crate::value::Value;

/// Parsed rows keyed by their original key; list positions become "0", "1", ...
pub type Rows = IndexMap<String, RecordInstance>;

/// What to do with rows that fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowValidation {
    /// Do not validate
    #[default]
    No,
    /// Fail on the first invalid row
    Throw,
    /// Keep only rows that pass
    Exclude,
    /// Keep only rows that fail
    Include,
}

impl RowValidation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no" => Some(RowValidation::No),
            "throw" => Some(RowValidation::Throw),
            "exclude" => Some(RowValidation::Exclude),
            "include" => Some(RowValidation::Include),
            _ => None,
        }
    }
}

/// Parses every row of `rows` (a list or a map of raw rows).
///
/// `options.validate` is ignored; `mode` decides. Exclude and Include check rows
/// with stop-on-fail.
pub fn parse_many(
    record_type: &Arc<RecordType>,
    rows: Value,
    mode: RowValidation,
    options: &ParseOptions,
) -> Result<Rows> {
    let keyed: Vec<(String, Value)> = match rows {
        Value::List(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i.to_string(), row))
            .collect(),
        Value::Map(map) => map.into_iter().collect(),
        other => {
            return Err(ParsingError::invalid_shape(
                record_type.name(),
                "$",
                "list of rows",
                other.kind_name(),
            )
            .into())
        }
    };

    let row_options = options.clone().validate(mode == RowValidation::Throw);
    let check = ValidateOptions {
        group: options.group.clone(),
        stop_on_fail: true,
    };

    let mut out = Rows::with_capacity(keyed.len());
    for (key, row) in keyed {
        let instance = parse(record_type, row, &row_options)?;
        let keep = match mode {
            RowValidation::No | RowValidation::Throw => true,
            RowValidation::Exclude => passes(&instance, &check)?,
            RowValidation::Include => !passes(&instance, &check)?,
        };
        if keep {
            out.insert(key, instance);
        }
    }
    Ok(out)
}

fn passes(instance: &RecordInstance, options: &ValidateOptions) -> Result<bool> {
    Ok(matches!(
        instance.validate(Mode::Bool, options)?,
        Outcome::Passed(true)
    ))
}
