//! External codecs
//!
//! Thin adapters between text or process state and the engine. Each decodes into a
//! raw `Value` and hands it to the parser, or takes a dump and encodes it. None of
//! them contain marshalling rules of their own.

pub mod env;
pub mod json;
pub mod query;
pub mod snapshot;

pub use json::JsonOptions;
pub use query::QueryOptions;

use crate::value::{Value, ValueMap};

/// Merges `extra` over a decoded map; other shapes are returned unchanged.
pub(crate) fn with_extra(raw: Value, extra: &ValueMap) -> Value {
    match raw {
        Value::Map(mut map) if !extra.is_empty() => {
            map.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            Value::Map(map)
        }
        other => other,
    }
}
