//! JSON text codec

use std::sync::Arc;

use super::with_extra;
use crate::dump::DumpOptions;
use crate::errors::Result;
use crate::parse::{self, ParseOptions};
use crate::record::RecordInstance;
use crate::schema::{RecordType, DEFAULT_GROUP};
use crate::value::{Value, ValueMap};

/// JSON rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    pub group: String,
    pub pretty: bool,
    pub skip_nulls: bool,
    pub by_alias: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            pretty: false,
            skip_nulls: false,
            by_alias: true,
        }
    }
}

/// Decodes JSON text into a raw value.
pub fn decode(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(Value::from(json))
}

pub fn parse(
    record_type: &Arc<RecordType>,
    text: &str,
    extra: &ValueMap,
    options: &ParseOptions,
) -> Result<RecordInstance> {
    let raw = with_extra(decode(text)?, extra);
    parse::parse(record_type, raw, options)
}

/// Renders a stringified dump of `instance` as JSON text.
pub fn render(instance: &RecordInstance, options: &JsonOptions) -> Result<String> {
    let dump = DumpOptions {
        group: options.group.clone(),
        skip_nulls: options.skip_nulls,
        by_alias: options.by_alias,
        stringify: true,
    };
    let value = Value::Map(instance.dump(&dump)?);
    let text = if options.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}
