//! recordcast - metadata-driven marshalling between loose data and typed records
//!
//! Record types are declared once with per-field metadata (aliases, formats, element
//! types, hooks, validators, named groups). The engine then parses raw maps, JSON,
//! query strings and environment snapshots into `RecordInstance`s, dumps them back,
//! and validates them.
//!
//! ```
//! use recordcast::{Candidate, FieldSpec, ParseOptions, RecordType, Value, ValidatorKind};
//!
//! let person = RecordType::builder("Person")
//!     .field(FieldSpec::new("name", Candidate::string()).alias("full_name"))
//!     .field(FieldSpec::new("age", Candidate::int()).validate(ValidatorKind::at_least(18)))
//!     .build()
//!     .unwrap();
//!
//! let ada = person
//!     .from_json(r#"{"full_name": "Ada", "age": "36"}"#, &ParseOptions::external())
//!     .unwrap();
//! assert_eq!(ada.get("age"), Some(&Value::Int(36)));
//! ```

pub mod batch;
pub mod binding;
pub mod codec;
pub mod config;
pub mod dump;
pub mod errors;
pub mod format;
pub mod observability;
pub mod parse;
pub mod range;
pub mod record;
pub mod schema;
pub mod validate;
pub mod value;

pub use batch::{RowValidation, Rows};
pub use binding::{BindError, Constructible, ConstructorArgs, FieldSource, FieldTarget};
pub use codec::{JsonOptions, QueryOptions};
pub use config::EngineConfig;
pub use dump::DumpOptions;
pub use errors::{DumpError, Error, ErrorCode, ParsingError, Result, StructuralError, ValidationError};
pub use parse::ParseOptions;
pub use range::{RangeError, RangeUnit, TemporalRange};
pub use record::RecordInstance;
pub use schema::{
    Candidate, EnumType, FieldSpec, Hook, MetadataEntry, Predicate, Primitive, RecordType,
    RecordTypeBuilder, TemporalKind, ValidatorKind, DEFAULT_GROUP,
};
pub use validate::{Mode, Outcome, ValidateOptions, ValidationFailures};
pub use value::{EnumValue, Value, ValueMap};
