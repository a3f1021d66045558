//! Observability for the engine
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed engine events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on marshalling results
//! 3. No async or background threads
//! 4. Deterministic output
//! 5. Disabled events cost one atomic load
//!
//! # Usage
//!
//! ```
//! use recordcast::observability::{Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! Event::RawKeyDiscarded.emit(&[("record", "Order"), ("key", "extra")]);
//! Logger::set_min_severity(Severity::Warn);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
