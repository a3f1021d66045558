//! Temporal ranges
//!
//! A range is a closed period between two temporal values of the same kind. Bounds are
//! kept as date-times: date ranges sit on midnight and time ranges on the epoch date, so
//! every kind shares one ordering. Text form is `start...finish`, each bound rendered
//! with the field's format.

use chrono::{Datelike, Duration, Months, NaiveDateTime, Timelike};
use std::fmt;
use thiserror::Error;

use crate::format::{FormatError, TemporalFormat};
use crate::schema::TemporalKind;
use crate::value::{temporal_as_datetime, Value, ISO_DATE, ISO_DATETIME, ISO_TIME};

/// Separator between the two bounds in text form.
pub const SEPARATOR: &str = "...";

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("finish {finish} is earlier than start {start}")]
    Inverted { start: String, finish: String },

    #[error("{kind} range bound cannot be a {found}")]
    KindMismatch { kind: &'static str, found: &'static str },

    #[error("'{0}' has no '...' separator")]
    MissingSeparator(String),

    #[error("step must be positive")]
    InvalidStep,

    #[error("a {kind} range cannot step by {unit}")]
    InvalidUnit { kind: &'static str, unit: &'static str },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Units for lengths and steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Microsecond,
}

impl RangeUnit {
    pub fn name(&self) -> &'static str {
        match self {
            RangeUnit::Year => "year",
            RangeUnit::Month => "month",
            RangeUnit::Day => "day",
            RangeUnit::Hour => "hour",
            RangeUnit::Minute => "minute",
            RangeUnit::Second => "second",
            RangeUnit::Microsecond => "microsecond",
        }
    }

    fn is_calendar(&self) -> bool {
        matches!(self, RangeUnit::Year | RangeUnit::Month | RangeUnit::Day)
    }
}

/// A closed period `start..=finish`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemporalRange {
    kind: TemporalKind,
    start: NaiveDateTime,
    finish: NaiveDateTime,
}

impl TemporalRange {
    /// Builds a range from two values of `kind`; the finish may not precede the start.
    pub fn new(kind: TemporalKind, start: &Value, finish: &Value) -> Result<Self, RangeError> {
        let start = bound(kind, start)?;
        let finish = bound(kind, finish)?;
        if finish < start {
            return Err(RangeError::Inverted {
                start: iso(kind, start),
                finish: iso(kind, finish),
            });
        }
        Ok(Self { kind, start, finish })
    }

    /// Parses `start...finish`, each bound with `format`.
    pub fn parse(kind: TemporalKind, format: &TemporalFormat, input: &str) -> Result<Self, RangeError> {
        let (start, finish) = input
            .split_once(SEPARATOR)
            .ok_or_else(|| RangeError::MissingSeparator(input.to_string()))?;
        let start = format.parse_str(kind, start.trim())?;
        let finish = format.parse_str(kind, finish.trim())?;
        Self::new(kind, &start, &finish)
    }

    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    pub fn start(&self) -> Value {
        to_value(self.kind, self.start)
    }

    pub fn finish(&self) -> Value {
        to_value(self.kind, self.finish)
    }

    /// Copy with a new start
    pub fn with_start(&self, start: &Value) -> Result<Self, RangeError> {
        Self::new(self.kind, start, &self.finish())
    }

    /// Copy with a new finish
    pub fn with_finish(&self, finish: &Value) -> Result<Self, RangeError> {
        Self::new(self.kind, &self.start(), finish)
    }

    /// True if `value` falls within the range, bounds included
    pub fn contains(&self, value: &Value) -> bool {
        bound(self.kind, value).is_ok_and(|at| self.start <= at && at <= self.finish)
    }

    /// Whole units between start and finish.
    pub fn length(&self, unit: RangeUnit) -> i64 {
        let span = self.finish - self.start;
        match unit {
            RangeUnit::Year => self.whole_months() / 12,
            RangeUnit::Month => self.whole_months(),
            RangeUnit::Day => span.num_days(),
            RangeUnit::Hour => span.num_hours(),
            RangeUnit::Minute => span.num_minutes(),
            RangeUnit::Second => span.num_seconds(),
            RangeUnit::Microsecond => span.num_microseconds().unwrap_or(i64::MAX),
        }
    }

    /// Values from start every `step` units, up to and including finish when it lands on a step.
    pub fn steps(&self, step: u32, unit: RangeUnit) -> Result<Vec<Value>, RangeError> {
        if step == 0 {
            return Err(RangeError::InvalidStep);
        }
        if self.kind == TemporalKind::Date && !unit.is_calendar() {
            return Err(RangeError::InvalidUnit {
                kind: self.kind.type_name(),
                unit: unit.name(),
            });
        }

        let mut out = Vec::new();
        let mut current = Some(self.start);
        while let Some(at) = current.filter(|at| *at <= self.finish) {
            out.push(to_value(self.kind, at));
            current = advance(at, step, unit);
        }
        Ok(out)
    }

    /// Renders both bounds with `format`, joined by the separator.
    pub fn render(&self, format: &TemporalFormat) -> Result<String, FormatError> {
        let (start, finish) = self.render_bounds(format)?;
        Ok(format!("{}{}{}", start, SEPARATOR, finish))
    }

    /// `start AND finish`, for a SQL `BETWEEN` clause
    pub fn to_sql(&self, format: &TemporalFormat) -> Result<String, FormatError> {
        let (start, finish) = self.render_bounds(format)?;
        Ok(format!("'{}' AND '{}'", start, finish))
    }

    fn render_bounds(&self, format: &TemporalFormat) -> Result<(String, String), FormatError> {
        let text = |value: Value| -> Result<String, FormatError> {
            Ok(match format.render(&value)? {
                Value::String(s) => s,
                other => other.to_json().to_string(),
            })
        };
        Ok((text(self.start())?, text(self.finish())?))
    }

    fn whole_months(&self) -> i64 {
        let years = i64::from(self.finish.year() - self.start.year());
        let mut months = years * 12 + i64::from(self.finish.month()) - i64::from(self.start.month());
        let start_rest = (self.start.day(), self.start.num_seconds_from_midnight(), self.start.nanosecond());
        let finish_rest = (self.finish.day(), self.finish.num_seconds_from_midnight(), self.finish.nanosecond());
        if finish_rest < start_rest {
            months -= 1;
        }
        months
    }
}

impl fmt::Display for TemporalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", iso(self.kind, self.start), SEPARATOR, iso(self.kind, self.finish))
    }
}

fn iso(kind: TemporalKind, at: NaiveDateTime) -> String {
    let pattern = match kind {
        TemporalKind::Date => ISO_DATE,
        TemporalKind::DateTime => ISO_DATETIME,
        TemporalKind::Time => ISO_TIME,
    };
    at.format(pattern).to_string()
}

fn bound(kind: TemporalKind, value: &Value) -> Result<NaiveDateTime, RangeError> {
    let mismatch = || RangeError::KindMismatch {
        kind: kind.type_name(),
        found: value.kind_name(),
    };
    if !kind.matches(value) {
        return Err(mismatch());
    }
    temporal_as_datetime(value).ok_or_else(mismatch)
}

fn to_value(kind: TemporalKind, at: NaiveDateTime) -> Value {
    match kind {
        TemporalKind::Date => Value::Date(at.date()),
        TemporalKind::DateTime => Value::DateTime(at),
        TemporalKind::Time => Value::Time(at.time()),
    }
}

fn advance(at: NaiveDateTime, step: u32, unit: RangeUnit) -> Option<NaiveDateTime> {
    let step = i64::from(step);
    match unit {
        RangeUnit::Year => at.checked_add_months(Months::new(u32::try_from(step * 12).ok()?)),
        RangeUnit::Month => at.checked_add_months(Months::new(u32::try_from(step).ok()?)),
        RangeUnit::Day => at.checked_add_signed(Duration::days(step)),
        RangeUnit::Hour => at.checked_add_signed(Duration::hours(step)),
        RangeUnit::Minute => at.checked_add_signed(Duration::minutes(step)),
        RangeUnit::Second => at.checked_add_signed(Duration::seconds(step)),
        RangeUnit::Microsecond => at.checked_add_signed(Duration::microseconds(step)),
    }
}
