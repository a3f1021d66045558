//! Persisted record snapshots
//!
//! A snapshot is the stringified, un-aliased dump of a record written as pretty JSON.
//! Reading one parses it back with conversion and validation on.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::dump::DumpOptions;
use crate::errors::Result;
use crate::observability::Event;
use crate::parse::{self, ParseOptions};
use crate::record::RecordInstance;
use crate::schema::RecordType;
use crate::value::Value;

pub fn write(instance: &RecordInstance, path: &Path, group: &str) -> Result<()> {
    let options = DumpOptions {
        group: group.to_string(),
        stringify: true,
        ..DumpOptions::default()
    };
    let value = Value::Map(instance.dump(&options)?);
    let text = serde_json::to_string_pretty(&value)?;
    fs::write(path, text)?;

    Event::SnapshotWritten.emit(&[
        ("record", instance.name()),
        ("path", &path.display().to_string()),
    ]);
    Ok(())
}

pub fn read(record_type: &Arc<RecordType>, path: &Path, group: &str) -> Result<RecordInstance> {
    let text = fs::read_to_string(path)?;
    let raw = super::json::decode(&text)?;
    let options = ParseOptions::default()
        .group(group)
        .by_alias(false)
        .convert(true)
        .validate(true);
    parse::parse(record_type, raw, &options)
}
