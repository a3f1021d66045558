//! Environment snapshot codec
//!
//! One variable per field, named after the field's alias (or canonical name when
//! `by_alias` is off). A missing variable reads as null unless the field declares a
//! default, in which case it is left out so the default applies.

use std::collections::HashMap;
use std::sync::Arc;

use super::with_extra;
use crate::errors::Result;
use crate::parse::{self, ParseOptions};
use crate::record::RecordInstance;
use crate::schema::RecordType;
use crate::value::{Value, ValueMap};

pub fn parse<I>(
    record_type: &Arc<RecordType>,
    vars: I,
    extra: &ValueMap,
    options: &ParseOptions,
) -> Result<RecordInstance>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let keys = record_type.field_names(options.by_alias, &options.group)?;

    let mut raw = ValueMap::with_capacity(keys.len());
    for (spec, key) in record_type.fields().iter().zip(keys) {
        match vars.get(&key) {
            Some(value) => {
                raw.insert(key, Value::String(value.clone()));
            }
            None if spec.default_value().is_some() => {}
            None => {
                raw.insert(key, Value::Null);
            }
        }
    }

    parse::parse(record_type, with_extra(Value::Map(raw), extra), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::schema::{Candidate, FieldSpec};

    fn settings() -> Arc<RecordType> {
        RecordType::builder("Settings")
            .field(FieldSpec::new("mode", Candidate::string()).alias("APP_ENV"))
            .field(FieldSpec::new("secret", Candidate::string()).alias("APP_SECRET"))
            .field(FieldSpec::new("ttl", Candidate::int()).alias("REDIS_TTL").with_default(60))
            .build()
            .unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reads_aliased_variables() {
        let v = vars(&[("APP_ENV", "env"), ("APP_SECRET", "secret"), ("REDIS_TTL", "30"), ("HOME", "/root")]);
        let r = parse(&settings(), v, &ValueMap::new(), &ParseOptions::external()).unwrap();
        assert_eq!(r.get("mode"), Some(&Value::from("env")));
        assert_eq!(r.get("secret"), Some(&Value::from("secret")));
        assert_eq!(r.get("ttl"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_missing_variable_uses_default_or_null() {
        let v = vars(&[("APP_ENV", "env"), ("APP_SECRET", "s")]);
        let r = parse(&settings(), v, &ValueMap::new(), &ParseOptions::external()).unwrap();
        assert_eq!(r.get("ttl"), Some(&Value::Int(60)));

        let v = vars(&[("APP_ENV", "env")]);
        let err = parse(&settings(), v, &ValueMap::new(), &ParseOptions::external()).unwrap_err();
        assert!(matches!(err, Error::Parsing(ref e) if e.path() == "secret"));
    }

    #[test]
    fn test_canonical_names_without_alias() {
        let v = vars(&[("mode", "m"), ("secret", "s")]);
        let options = ParseOptions::external().by_alias(false);
        let r = parse(&settings(), v, &ValueMap::new(), &options).unwrap();
        assert_eq!(r.get("mode"), Some(&Value::from("m")));
    }
}
