//! Percent-encoded query string codec
//!
//! Nested keys use bracket notation: `tags[0]=a&owner[name]=b`. An empty bracket
//! (`tags[]=a`) appends. Decoded maps whose keys are exactly `0..n` become lists.
//! Booleans encode as `1`/`0`; nulls are left out.

use std::sync::Arc;
use url::form_urlencoded;

use super::with_extra;
use crate::dump::DumpOptions;
use crate::errors::Result;
use crate::parse::{self, ParseOptions};
use crate::record::RecordInstance;
use crate::schema::{RecordType, DEFAULT_GROUP};
use crate::value::{Value, ValueMap};

/// Query string rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub group: String,
    pub skip_nulls: bool,
    pub by_alias: bool,
    /// Output keys left out of the query
    pub omit: Vec<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            skip_nulls: true,
            by_alias: true,
            omit: Vec::new(),
        }
    }
}

impl QueryOptions {
    pub fn omit(mut self, key: &str) -> Self {
        self.omit.push(key.to_string());
        self
    }
}

/// Decodes a query string into a raw map.
pub fn decode(text: &str) -> Value {
    let mut root = ValueMap::new();
    for (key, value) in form_urlencoded::parse(text.trim_start_matches('?').as_bytes()) {
        let segments = split_key(&key);
        insert(&mut root, &segments, Value::String(value.into_owned()));
    }
    listify(Value::Map(root))
}

pub fn parse(
    record_type: &Arc<RecordType>,
    text: &str,
    extra: &ValueMap,
    options: &ParseOptions,
) -> Result<RecordInstance> {
    let raw = with_extra(decode(text), extra);
    parse::parse(record_type, raw, options)
}

/// Renders a stringified dump of `instance` as a query string.
pub fn render(instance: &RecordInstance, options: &QueryOptions) -> Result<String> {
    let dump = DumpOptions {
        group: options.group.clone(),
        skip_nulls: options.skip_nulls,
        by_alias: options.by_alias,
        stringify: true,
    };
    let map = instance.dump(&dump)?;
    Ok(encode(&map, &options.omit))
}

/// Encodes a map, leaving out top-level keys listed in `omit`.
pub fn encode(map: &ValueMap, omit: &[String]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        if omit.contains(key) {
            continue;
        }
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "1" } else { "0" });
        }
        Value::Int(i) => {
            serializer.append_pair(key, &i.to_string());
        }
        Value::Float(f) => {
            serializer.append_pair(key, &f.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                append(serializer, &format!("{}[{}]", key, i), item);
            }
        }
        Value::Map(map) => {
            for (k, item) in map {
                append(serializer, &format!("{}[{}]", key, k), item);
            }
        }
        Value::Record(record) => {
            for (k, item) in record.fields() {
                append(serializer, &format!("{}[{}]", key, k), item);
            }
        }
        other => match other.to_json() {
            serde_json::Value::String(s) => {
                serializer.append_pair(key, &s);
            }
            json => {
                serializer.append_pair(key, &json.to_string());
            }
        },
    }
}

/// `a[b][]` -> `["a", "b", ""]`
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                segments.push(stripped[..close].to_string());
                rest = &stripped[close + 1..];
            }
            None => {
                // Unbalanced brackets: keep the remainder as part of the last segment
                if let Some(last) = segments.last_mut() {
                    last.push_str(rest);
                }
                return segments;
            }
        }
    }
    segments
}

fn insert(map: &mut ValueMap, segments: &[String], value: Value) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };
    let key = if head.is_empty() {
        map.len().to_string()
    } else {
        head.clone()
    };

    if tail.is_empty() {
        map.insert(key, value);
        return;
    }

    let slot = map.entry(key).or_insert_with(|| Value::Map(ValueMap::new()));
    if !matches!(slot, Value::Map(_)) {
        *slot = Value::Map(ValueMap::new());
    }
    if let Value::Map(inner) = slot {
        insert(inner, tail, value);
    }
}

fn listify(value: Value) -> Value {
    match value {
        Value::Map(map) => {
            let sequential = !map.is_empty()
                && map.keys().enumerate().all(|(i, k)| k == &i.to_string());
            let converted = map.into_iter().map(|(k, v)| (k, listify(v)));
            if sequential {
                Value::List(converted.map(|(_, v)| v).collect())
            } else {
                Value::Map(converted.collect())
            }
        }
        other => other,
    }
}
