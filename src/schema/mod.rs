//! Record schema declarations
//!
//! # Design Principles
//!
//! - Declared once, immutable afterwards
//! - Metadata is explicit data, attached through builders
//! - Groups fully isolated from one another
//! - Declaration bugs surface at build time

mod group;
mod metadata;
mod types;

pub(crate) use metadata::Direction;

pub use group::{merge, Group, ResolvedGroups, DEFAULT_GROUP};
pub use metadata::{EntryKind, Hook, HookFn, MetadataEntry, Predicate, PredicateFn, ValidatorKind};
pub use types::{
    Candidate, EnumCase, EnumType, FieldSpec, Primitive, RecordType, RecordTypeBuilder,
    TemporalKind,
};
