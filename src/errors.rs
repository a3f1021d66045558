//! Error types
//!
//! Error codes:
//! - RECORD_UNKNOWN_GROUP (structural)
//! - RECORD_DUPLICATE_METADATA (structural)
//! - RECORD_DUPLICATE_FIELD (structural)
//! - RECORD_ALIAS_COLLISION (structural)
//! - RECORD_MISSING_HOOK (structural)
//! - RECORD_FIELD_COUNT (structural)
//! - RECORD_INVALID_DECLARATION (structural)
//! - RECORD_MISSING_FIELD (parsing)
//! - RECORD_UNCOERCIBLE_VALUE (parsing)
//! - RECORD_INVALID_SHAPE (parsing)
//! - RECORD_HOOK_FAILED (parsing)
//! - RECORD_VALIDATION_FAILED (validation)
//!
//! Structural errors point at a declaration bug and are never retried. Parsing errors
//! carry the dotted field path and the owning record type. Validation errors carry the
//! full failure map. Errors produced by external codecs surface unwrapped.

use std::fmt;
use thiserror::Error;

use crate::binding::BindError;
use crate::validate::ValidationFailures;

/// Error returned by custom hooks and chained as the cause of parsing errors.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Schema declaration bug
    Structural,
    /// Input value cannot be turned into the declared shape
    Parsing,
    /// Parsed record violates declared predicates
    Validation,
    /// Record value cannot be written out
    Dumping,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Structural => write!(f, "STRUCTURAL"),
            Category::Parsing => write!(f, "PARSING"),
            Category::Validation => write!(f, "VALIDATION"),
            Category::Dumping => write!(f, "DUMPING"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownGroup,
    DuplicateMetadata,
    DuplicateField,
    AliasCollision,
    MissingHook,
    FieldCount,
    InvalidDeclaration,
    MissingField,
    UncoercibleValue,
    InvalidShape,
    HookFailed,
    ValidationFailed,
    DumpHookFailed,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnknownGroup => "RECORD_UNKNOWN_GROUP",
            ErrorCode::DuplicateMetadata => "RECORD_DUPLICATE_METADATA",
            ErrorCode::DuplicateField => "RECORD_DUPLICATE_FIELD",
            ErrorCode::AliasCollision => "RECORD_ALIAS_COLLISION",
            ErrorCode::MissingHook => "RECORD_MISSING_HOOK",
            ErrorCode::FieldCount => "RECORD_FIELD_COUNT",
            ErrorCode::InvalidDeclaration => "RECORD_INVALID_DECLARATION",
            ErrorCode::MissingField => "RECORD_MISSING_FIELD",
            ErrorCode::UncoercibleValue => "RECORD_UNCOERCIBLE_VALUE",
            ErrorCode::InvalidShape => "RECORD_INVALID_SHAPE",
            ErrorCode::HookFailed => "RECORD_HOOK_FAILED",
            ErrorCode::ValidationFailed => "RECORD_VALIDATION_FAILED",
            ErrorCode::DumpHookFailed => "RECORD_DUMP_HOOK_FAILED",
        }
    }

    /// Returns the category of this code
    pub fn category(&self) -> Category {
        match self {
            ErrorCode::UnknownGroup
            | ErrorCode::DuplicateMetadata
            | ErrorCode::DuplicateField
            | ErrorCode::AliasCollision
            | ErrorCode::MissingHook
            | ErrorCode::FieldCount
            | ErrorCode::InvalidDeclaration => Category::Structural,
            ErrorCode::MissingField
            | ErrorCode::UncoercibleValue
            | ErrorCode::InvalidShape
            | ErrorCode::HookFailed => Category::Parsing,
            ErrorCode::ValidationFailed => Category::Validation,
            ErrorCode::DumpHookFailed => Category::Dumping,
        }
    }

    /// Structural codes that depend only on the declaration, never on the input.
    /// `FieldCount` is structural but raised by short positional input.
    pub fn is_declaration(&self) -> bool {
        self.category() == Category::Structural && *self != ErrorCode::FieldCount
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Declaration-level error.
#[derive(Debug, Clone)]
pub struct StructuralError {
    code: ErrorCode,
    message: String,
    record: String,
    field: Option<String>,
}

impl StructuralError {
    fn new(code: ErrorCode, record: &str, field: Option<&str>, message: String) -> Self {
        Self {
            code,
            message,
            record: record.to_string(),
            field: field.map(str::to_string),
        }
    }

    pub fn unknown_group(record: &str, group: &str) -> Self {
        Self::new(
            ErrorCode::UnknownGroup,
            record,
            None,
            format!("No such group: '{}'", group),
        )
    }

    pub fn duplicate_metadata(record: &str, field: Option<&str>, group: &str, kind: &str) -> Self {
        let target = field.map_or_else(|| "schema".to_string(), |f| format!("field '{}'", f));
        Self::new(
            ErrorCode::DuplicateMetadata,
            record,
            field,
            format!("{} declares {} more than once in group '{}'", target, kind, group),
        )
    }

    pub fn duplicate_field(record: &str, field: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateField,
            record,
            Some(field),
            format!("field '{}' is declared more than once", field),
        )
    }

    pub fn alias_collision(record: &str, group: &str, key: &str, first: &str, second: &str) -> Self {
        Self::new(
            ErrorCode::AliasCollision,
            record,
            Some(second),
            format!(
                "fields '{}' and '{}' both map to key '{}' in group '{}'",
                first, second, key, group
            ),
        )
    }

    pub fn missing_hook(record: &str, field: Option<&str>, name: &str) -> Self {
        Self::new(
            ErrorCode::MissingHook,
            record,
            field,
            format!("no method named '{}' is registered", name),
        )
    }

    pub fn field_count(record: &str, field: &str, given: usize, declared: usize) -> Self {
        Self::new(
            ErrorCode::FieldCount,
            record,
            Some(field),
            format!(
                "{} positional values for {} fields: no value or default for required field '{}'",
                given, declared, field
            ),
        )
    }

    pub fn invalid_declaration(record: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDeclaration, record, field, reason.into())
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.record, self.message)
    }
}

impl std::error::Error for StructuralError {}

/// Input-level error with the offending field path.
#[derive(Debug)]
pub struct ParsingError {
    code: ErrorCode,
    record: String,
    path: String,
    message: String,
    source: Option<HookError>,
}

impl ParsingError {
    fn new(code: ErrorCode, record: &str, path: &str, message: String) -> Self {
        Self {
            code,
            record: record.to_string(),
            path: path.to_string(),
            message,
            source: None,
        }
    }

    pub fn missing_field(record: &str, path: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            record,
            path,
            "no value provided for required field".to_string(),
        )
    }

    pub fn uncoercible(record: &str, path: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::UncoercibleValue,
            record,
            path,
            format!("cannot parse {} as {}", actual, expected),
        )
    }

    pub fn invalid_shape(record: &str, path: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::InvalidShape,
            record,
            path,
            format!("expected {}, got {}", expected, actual),
        )
    }

    pub fn hook_failed(record: &str, path: &str, hook: &str, cause: HookError) -> Self {
        let mut err = Self::new(
            ErrorCode::HookFailed,
            record,
            path,
            format!("{} hook failed: {}", hook, cause),
        );
        err.source = Some(cause);
        err
    }

    /// Attaches an underlying cause.
    pub fn caused_by(mut self, cause: impl Into<HookError>) -> Self {
        self.source = Some(cause.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    /// Dotted/indexed path of the offending field, e.g. `events[1].name`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} field '{}': {}",
            self.code, self.record, self.path, self.message
        )
    }
}

impl std::error::Error for ParsingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Output-level error raised while dumping a record.
#[derive(Debug)]
pub struct DumpError {
    code: ErrorCode,
    record: String,
    path: String,
    message: String,
    source: Option<HookError>,
}

impl DumpError {
    pub fn hook_failed(record: &str, path: &str, hook: &str, cause: HookError) -> Self {
        Self {
            code: ErrorCode::DumpHookFailed,
            record: record.to_string(),
            path: path.to_string(),
            message: format!("{} hook failed: {}", hook, cause),
            source: Some(cause),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} field '{}': {}",
            self.code, self.record, self.path, self.message
        )
    }
}

impl std::error::Error for DumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Raised when validation runs in throwing mode and any predicate failed.
#[derive(Debug, Clone)]
pub struct ValidationError {
    record: String,
    failures: ValidationFailures,
}

impl ValidationError {
    pub fn new(record: &str, failures: ValidationFailures) -> Self {
        Self {
            record: record.to_string(),
            failures,
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::ValidationFailed
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn failures(&self) -> &ValidationFailures {
        &self.failures
    }

    pub fn into_failures(self) -> ValidationFailures {
        self.failures
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.failures.fields().collect();
        let rendered = serde_json::to_string_pretty(&self.failures.to_json())
            .map_err(|_| fmt::Error)?;
        write!(
            f,
            "[{}] {}: validation for field(s) `{}` failed:\n{}",
            self.code(),
            self.record,
            fields.join("`, `"),
            rendered
        )
    }
}

impl std::error::Error for ValidationError {}

/// Crate error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dumping(#[from] DumpError),

    #[error(transparent)]
    Binding(#[from] BindError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns the engine error code, if this is an engine error
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Structural(e) => Some(e.code()),
            Error::Parsing(e) => Some(e.code()),
            Error::Validation(e) => Some(e.code()),
            Error::Dumping(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Returns the category, if this is an engine error
    pub fn category(&self) -> Option<Category> {
        self.code().map(|c| c.category())
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural(_))
    }

    /// True for declaration bugs, which no other union candidate can recover from
    pub fn is_declaration(&self) -> bool {
        matches!(self, Error::Structural(e) if e.code().is_declaration())
    }

    pub fn is_parsing(&self) -> bool {
        matches!(self, Error::Parsing(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
