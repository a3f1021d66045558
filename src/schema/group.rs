//! Attribute group resolution
//!
//! Entries outside any `Group` belong to the `default` group only. Entries inside
//! `Group(name, ..)` belong to that name only. Resolving one name never sees the
//! entries of another.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::errors::StructuralError;
use crate::schema::metadata::{EntryKind, Hook, MetadataEntry, ValidatorKind};
use crate::schema::types::{FieldSpec, RecordType};

/// Name of the implicit group
pub const DEFAULT_GROUP: &str = "default";

/// Merged metadata of one field (or of the schema) for one group.
#[derive(Debug, Clone, Default)]
pub struct Group {
    alias: Option<String>,
    format: Option<String>,
    element_type: Option<Arc<RecordType>>,
    propagate: bool,
    parse_hook: Option<Hook>,
    dump_hook: Option<Hook>,
    validators: Vec<ValidatorKind>,
}

impl Group {
    /// Adds one entry. Returns the offending kind when a single-occurrence entry is
    /// already present. Nested `Group` entries are ignored here.
    pub fn add(&mut self, entry: &MetadataEntry) -> Result<(), EntryKind> {
        fn set<T>(slot: &mut Option<T>, value: T, kind: EntryKind) -> Result<(), EntryKind> {
            if slot.is_some() {
                return Err(kind);
            }
            *slot = Some(value);
            Ok(())
        }

        match entry {
            MetadataEntry::Alias(name) => set(&mut self.alias, name.clone(), EntryKind::Alias),
            MetadataEntry::Format(p) => set(&mut self.format, p.clone(), EntryKind::Format),
            MetadataEntry::ElementType(t) => {
                set(&mut self.element_type, Arc::clone(t), EntryKind::ElementType)
            }
            MetadataEntry::ParseHook(h) => set(&mut self.parse_hook, h.clone(), EntryKind::ParseHook),
            MetadataEntry::DumpHook(h) => set(&mut self.dump_hook, h.clone(), EntryKind::DumpHook),
            MetadataEntry::Propagate => {
                if self.propagate {
                    return Err(EntryKind::Propagate);
                }
                self.propagate = true;
                Ok(())
            }
            MetadataEntry::Validator(kind) => {
                self.validators.push(kind.clone());
                Ok(())
            }
            MetadataEntry::Group { .. } => Ok(()),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn element_type(&self) -> Option<&Arc<RecordType>> {
        self.element_type.as_ref()
    }

    pub fn is_propagated(&self) -> bool {
        self.propagate
    }

    pub fn parse_hook(&self) -> Option<&Hook> {
        self.parse_hook.as_ref()
    }

    pub fn dump_hook(&self) -> Option<&Hook> {
        self.dump_hook.as_ref()
    }

    /// Validators in declaration order
    pub fn validators(&self) -> &[ValidatorKind] {
        &self.validators
    }
}

/// Merges the entries that apply to `group`.
pub fn merge(entries: &[MetadataEntry], group: &str) -> Result<Group, EntryKind> {
    let mut merged = Group::default();
    for entry in entries {
        match entry {
            MetadataEntry::Group { name, entries } => {
                if name == group {
                    for inner in entries {
                        merged.add(inner)?;
                    }
                }
            }
            other => {
                if group == DEFAULT_GROUP {
                    merged.add(other)?;
                }
            }
        }
    }
    Ok(merged)
}

/// Group names declared by `Group` entries.
pub fn declared_names(entries: &[MetadataEntry]) -> impl Iterator<Item = &str> {
    entries.iter().filter_map(|entry| match entry {
        MetadataEntry::Group { name, .. } => Some(name.as_str()),
        _ => None,
    })
}

/// Schema and per-field groups of one record type for one group name.
#[derive(Debug, Clone)]
pub struct ResolvedGroups {
    name: String,
    schema: Group,
    fields: Vec<Group>,
    /// External key (alias or canonical name) to field index
    keys: IndexMap<String, usize>,
}

impl ResolvedGroups {
    /// Resolves `group` over the schema entries and every field.
    pub fn resolve(
        record: &str,
        schema_entries: &[MetadataEntry],
        fields: &[FieldSpec],
        group: &str,
    ) -> Result<Self, StructuralError> {
        let schema = merge(schema_entries, group)
            .map_err(|kind| StructuralError::duplicate_metadata(record, None, group, kind.as_str()))?;

        let mut groups = Vec::with_capacity(fields.len());
        let mut keys: IndexMap<String, usize> = IndexMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let resolved = merge(field.entries(), group).map_err(|kind| {
                StructuralError::duplicate_metadata(record, Some(field.name()), group, kind.as_str())
            })?;

            let key = resolved.alias().unwrap_or(field.name()).to_string();
            if let Some(&first) = keys.get(&key) {
                return Err(StructuralError::alias_collision(
                    record,
                    group,
                    &key,
                    fields[first].name(),
                    field.name(),
                ));
            }
            keys.insert(key, index);
            groups.push(resolved);
        }

        Ok(Self {
            name: group.to_string(),
            schema,
            fields: groups,
            keys,
        })
    }

    /// Groups with no metadata at all, used for nested types that never declare a group.
    pub fn empty(group: &str, fields: &[FieldSpec]) -> Self {
        Self {
            name: group.to_string(),
            schema: Group::default(),
            fields: vec![Group::default(); fields.len()],
            keys: fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name().to_string(), i))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Group {
        &self.schema
    }

    /// Group of the field at `index` in declaration order
    pub fn field(&self, index: usize) -> &Group {
        &self.fields[index]
    }

    /// Field index whose external key is `key`
    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    /// (external key, field index) pairs in declaration order
    pub fn keys(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().map(|(k, i)| (k.as_str(), *i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Candidate;

    fn entries() -> Vec<MetadataEntry> {
        vec![
            MetadataEntry::alias("d"),
            MetadataEntry::Validator(ValidatorKind::NotNull),
            MetadataEntry::group("input", vec![MetadataEntry::alias("dt")]),
            MetadataEntry::group("output", vec![MetadataEntry::alias("timestamp")]),
        ]
    }

    #[test]
    fn test_default_group_excludes_named_groups() {
        let group = merge(&entries(), DEFAULT_GROUP).unwrap();
        assert_eq!(group.alias(), Some("d"));
        assert_eq!(group.validators().len(), 1);
    }

    #[test]
    fn test_named_group_excludes_ungrouped_entries() {
        let group = merge(&entries(), "input").unwrap();
        assert_eq!(group.alias(), Some("dt"));
        assert!(group.validators().is_empty());

        let other = merge(&entries(), "output").unwrap();
        assert_eq!(other.alias(), Some("timestamp"));
    }

    #[test]
    fn test_duplicate_single_kind_rejected() {
        let dup = vec![MetadataEntry::format("Y"), MetadataEntry::format("Y-m")];
        assert_eq!(merge(&dup, DEFAULT_GROUP).unwrap_err(), EntryKind::Format);

        // Same kind in different groups is fine
        let split = vec![
            MetadataEntry::format("Y"),
            MetadataEntry::group("input", vec![MetadataEntry::format("Y-m")]),
        ];
        assert!(merge(&split, "input").is_ok());
    }

    #[test]
    fn test_validators_are_repeatable() {
        let many = vec![
            MetadataEntry::Validator(ValidatorKind::greater_than(17)),
            MetadataEntry::Validator(ValidatorKind::lower_than(100)),
        ];
        assert_eq!(merge(&many, DEFAULT_GROUP).unwrap().validators().len(), 2);
    }

    #[test]
    fn test_resolve_detects_alias_collision() {
        let fields = vec![
            FieldSpec::new("a", Candidate::int()).alias("b"),
            FieldSpec::new("b", Candidate::int()),
        ];
        let err = ResolvedGroups::resolve("Pair", &[], &fields, DEFAULT_GROUP).unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::AliasCollision);
    }

    #[test]
    fn test_resolve_maps_keys() {
        let fields = vec![
            FieldSpec::new("date", Candidate::datetime())
                .group("input", vec![MetadataEntry::alias("dt")]),
            FieldSpec::new("status", Candidate::string()),
        ];
        let input = ResolvedGroups::resolve("S", &[], &fields, "input").unwrap();
        assert_eq!(input.index_of_key("dt"), Some(0));
        assert_eq!(input.index_of_key("date"), None);
        assert_eq!(input.index_of_key("status"), Some(1));
    }
}
