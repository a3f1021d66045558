//! Observable engine events
//!
//! Events are explicit and typed; the logger only ever sees their string form.

use std::fmt;

use super::logger::{Logger, Severity};

/// Observable events emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Declaration
    /// A record type finished building
    RecordTypeBuilt,

    // Parsing
    /// A union candidate rejected a value and the next one is tried
    CandidateRejected,
    /// A raw key matched no declared field and was dropped
    RawKeyDiscarded,
    /// A custom parse hook replaced type-directed coercion
    ParseHookInvoked,
    /// A record was materialized from raw input
    RecordParsed,

    // Dumping
    /// A custom dump hook replaced default stringification
    DumpHookInvoked,

    // Validation
    /// Validation in throwing mode found failures
    ValidationFailed,

    // Binding
    /// A field map entry matched no binding channel
    BindingSkipped,

    // Persistence
    /// A record snapshot was written to disk
    SnapshotWritten,

    // Configuration
    /// Engine configuration installed
    ConfigInstalled,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RecordTypeBuilt => "RECORD_TYPE_BUILT",
            Event::CandidateRejected => "CANDIDATE_REJECTED",
            Event::RawKeyDiscarded => "RAW_KEY_DISCARDED",
            Event::ParseHookInvoked => "PARSE_HOOK_INVOKED",
            Event::RecordParsed => "RECORD_PARSED",
            Event::DumpHookInvoked => "DUMP_HOOK_INVOKED",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::BindingSkipped => "BINDING_SKIPPED",
            Event::SnapshotWritten => "SNAPSHOT_WRITTEN",
            Event::ConfigInstalled => "CONFIG_INSTALLED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ValidationFailed => Severity::Warn,
            Event::ConfigInstalled | Event::SnapshotWritten => Severity::Info,
            _ => Severity::Trace,
        }
    }

    /// Logs this event at its own severity
    pub fn emit(&self, fields: &[(&str, &str)]) {
        Logger::log(self.severity(), self.as_str(), fields);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
