//! Temporal format patterns
//!
//! Patterns use single-letter date codes (`Y-m-d\TH:i:s`), translated once into chrono
//! strftime items. A backslash makes the next character literal. The special pattern
//! `unix` means integer epoch seconds.
//!
//! | code | meaning | code | meaning |
//! |---|---|---|---|
//! | `Y` | 4-digit year | `y` | 2-digit year |
//! | `m` | month, 01-12 | `n` | month, no padding |
//! | `d` | day, 01-31 | `j` | day, no padding |
//! | `M` | short month name | `F` | full month name |
//! | `D` | short weekday | `l` | full weekday |
//! | `H` | hour, 00-23 | `G` | hour, no padding |
//! | `h` | hour, 01-12 | `g` | hour 1-12, no padding |
//! | `i` | minutes | `s` | seconds |
//! | `u` | microseconds | `v` | milliseconds |
//! | `A` | AM/PM | `a` | am/pm |
//! | `P` | offset `+00:00` | `O` | offset `+0000` |
//! | `U` | epoch seconds | `c` | ISO-8601 with offset |

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write as _;
use thiserror::Error;

use crate::config;
use crate::schema::{Group, TemporalKind};
use crate::value::{seconds_of_day, temporal_as_datetime, Value};

/// Pattern used when neither the field nor the schema declares one
pub const DEFAULT_PATTERN: &str = "Y-m-d\\TH:i:s";
/// Special pattern: integer epoch seconds
pub const UNIX: &str = "unix";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("'{input}' does not match format '{pattern}'")]
    Mismatch { input: String, pattern: String },

    #[error("epoch value {0} is out of range")]
    OutOfRange(i64),

    #[error("format '{pattern}' cannot render a {kind}")]
    Unrenderable { pattern: String, kind: &'static str },
}

/// A compiled temporal pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFormat {
    pattern: String,
    strftime: String,
}

impl TemporalFormat {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            strftime: translate(pattern),
        }
    }

    /// Declared pattern, as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Equivalent strftime string
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn is_unix(&self) -> bool {
        self.pattern == UNIX
    }

    /// Parses a string into a temporal value of the given kind.
    pub fn parse_str(&self, kind: TemporalKind, input: &str) -> Result<Value, FormatError> {
        if self.is_unix() {
            let secs = input.trim().parse::<i64>().map_err(|_| self.mismatch(input))?;
            return from_epoch(kind, secs);
        }

        let mut parsed = Parsed::new();
        parse(&mut parsed, input, StrftimeItems::new(&self.strftime))
            .map_err(|_| self.mismatch(input))?;

        // Values carrying an offset are normalized to UTC
        let offset = parsed.offset.map(i64::from);
        let to_utc = |local: NaiveDateTime| match offset {
            Some(secs) => local.checked_sub_signed(Duration::seconds(secs)),
            None => Some(local),
        };

        let date = parsed.to_naive_date().ok();
        let time = parsed.to_naive_time().ok();
        let stamped = match offset {
            Some(_) => parsed.to_datetime().ok().map(|dt| dt.naive_utc()),
            None => parsed.to_naive_datetime_with_offset(0).ok(),
        };

        let value = match kind {
            TemporalKind::Date => match offset {
                Some(_) => stamped.map(|dt| dt.date()).or(date),
                None => date.or_else(|| stamped.map(|dt| dt.date())),
            }
            .map(Value::Date),
            TemporalKind::Time => match offset {
                Some(_) => stamped.map(|dt| dt.time()).or_else(|| {
                    let local = epoch_date()?.and_time(time?);
                    to_utc(local).map(|dt| dt.time())
                }),
                None => time.or_else(|| stamped.map(|dt| dt.time())),
            }
            .map(Value::Time),
            TemporalKind::DateTime => stamped
                .or_else(|| match (date, time) {
                    (Some(d), Some(t)) => to_utc(d.and_time(t)),
                    (Some(d), None) => d.and_hms_opt(0, 0, 0),
                    (None, Some(t)) => epoch_date().map(|d| d.and_time(t)).and_then(to_utc),
                    (None, None) => None,
                })
                .map(Value::DateTime),
        };
        value.ok_or_else(|| self.mismatch(input))
    }

    /// Renders a temporal value: a string, or epoch seconds for `unix`.
    pub fn render(&self, value: &Value) -> Result<Value, FormatError> {
        if self.is_unix() {
            return match value {
                Value::Time(t) => Ok(Value::Int(seconds_of_day(t))),
                other => temporal_as_datetime(other)
                    .map(|dt| Value::Int(dt.and_utc().timestamp()))
                    .ok_or_else(|| self.unrenderable(other)),
            };
        }

        let naive = temporal_as_datetime(value).ok_or_else(|| self.unrenderable(value))?;
        let stamped = Utc.from_utc_datetime(&naive);
        let mut out = String::new();
        write!(out, "{}", stamped.format(&self.strftime)).map_err(|_| self.unrenderable(value))?;
        Ok(Value::String(out))
    }

    fn mismatch(&self, input: &str) -> FormatError {
        FormatError::Mismatch {
            input: input.to_string(),
            pattern: self.pattern.clone(),
        }
    }

    fn unrenderable(&self, value: &Value) -> FormatError {
        FormatError::Unrenderable {
            pattern: self.pattern.clone(),
            kind: value.kind_name(),
        }
    }
}

/// Builds a temporal value of the given kind from epoch seconds (UTC).
pub fn from_epoch(kind: TemporalKind, secs: i64) -> Result<Value, FormatError> {
    let dt = DateTime::from_timestamp(secs, 0)
        .ok_or(FormatError::OutOfRange(secs))?
        .naive_utc();
    Ok(match kind {
        TemporalKind::Date => Value::Date(dt.date()),
        TemporalKind::DateTime => Value::DateTime(dt),
        TemporalKind::Time => Value::Time(dt.time()),
    })
}

/// Pattern that applies to a field: its own, then the schema's, then the configured default.
pub fn resolve(field: &Group, schema: &Group) -> TemporalFormat {
    let pattern = field
        .format()
        .or_else(|| schema.format())
        .unwrap_or(config::current().default_format.as_str());
    TemporalFormat::new(pattern)
}

/// ISO-8601 rendering with a UTC offset, used for display.
pub fn iso8601(value: &Value) -> Option<String> {
    let naive: NaiveDateTime = temporal_as_datetime(value)?;
    Some(Utc.from_utc_datetime(&naive).format("%Y-%m-%dT%H:%M:%S%:z").to_string())
}

fn epoch_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
}

/// Translates a date-letter pattern into a strftime string.
pub fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let spec = match c {
            '\\' => {
                if let Some(lit) = chars.next() {
                    push_literal(&mut out, lit);
                }
                continue;
            }
            'Y' => "%Y",
            'y' => "%y",
            'm' => "%m",
            'n' => "%-m",
            'd' => "%d",
            'j' => "%-d",
            'M' => "%b",
            'F' => "%B",
            'D' => "%a",
            'l' => "%A",
            'H' => "%H",
            'G' => "%-H",
            'h' => "%I",
            'g' => "%-I",
            'i' => "%M",
            's' => "%S",
            'u' => "%6f",
            'v' => "%3f",
            'A' => "%p",
            'a' => "%P",
            'P' => "%:z",
            'O' => "%z",
            'U' => "%s",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            other => {
                push_literal(&mut out, other);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_translate_default_pattern() {
        assert_eq!(translate(DEFAULT_PATTERN), "%Y-%m-%dT%H:%M:%S");
        assert_eq!(translate("Y-m-d H:i:s.u"), "%Y-%m-%d %H:%M:%S.%6f");
        assert_eq!(translate("d%"), "%d%%");
    }

    #[test]
    fn test_parse_date_only_pattern() {
        let f = TemporalFormat::new("Y-m-d");
        assert_eq!(
            f.parse_str(TemporalKind::Date, "2024-03-02").unwrap(),
            Value::Date(date(2024, 3, 2))
        );
        assert_eq!(
            f.parse_str(TemporalKind::DateTime, "2024-03-02").unwrap(),
            Value::DateTime(date(2024, 3, 2).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_time_only_pattern() {
        let f = TemporalFormat::new("H:i:s");
        assert_eq!(
            f.parse_str(TemporalKind::Time, "09:15:00").unwrap(),
            Value::Time(NaiveTime::from_hms_opt(9, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_mismatch() {
        let f = TemporalFormat::new("Y-m-d");
        let err = f.parse_str(TemporalKind::Date, "02/03/2024").unwrap_err();
        assert!(matches!(err, FormatError::Mismatch { .. }));
    }

    #[test]
    fn test_unix_roundtrip() {
        let f = TemporalFormat::new(UNIX);
        let dt = date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        let rendered = f.render(&Value::DateTime(dt)).unwrap();
        assert_eq!(rendered, Value::Int(1_735_689_600));
        assert_eq!(
            from_epoch(TemporalKind::DateTime, 1_735_689_600).unwrap(),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn test_render_with_literal_escape() {
        let f = TemporalFormat::new(DEFAULT_PATTERN);
        let dt = date(2024, 3, 2).and_hms_opt(8, 5, 9).unwrap();
        assert_eq!(
            f.render(&Value::DateTime(dt)).unwrap(),
            Value::String("2024-03-02T08:05:09".into())
        );
    }

    #[test]
    fn test_render_rejects_non_temporal() {
        let f = TemporalFormat::new("Y");
        assert!(f.render(&Value::Int(3)).is_err());
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        let f = TemporalFormat::new("Y-m-d\\TH:i:sP");
        let parsed = f
            .parse_str(TemporalKind::DateTime, "2024-03-02T10:00:00+03:00")
            .unwrap();
        assert_eq!(
            parsed,
            Value::DateTime(date(2024, 3, 2).and_hms_opt(7, 0, 0).unwrap())
        );
        assert_eq!(
            f.render(&parsed).unwrap(),
            Value::String("2024-03-02T07:00:00+00:00".into())
        );

        let compact = TemporalFormat::new("Y-m-d H:iO");
        assert_eq!(
            compact.parse_str(TemporalKind::DateTime, "2024-03-02 01:30-0200").unwrap(),
            Value::DateTime(date(2024, 3, 2).and_hms_opt(3, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_offset_can_move_the_date() {
        let f = TemporalFormat::new("c");
        assert_eq!(
            f.parse_str(TemporalKind::Date, "2024-03-02T01:00:00+03:00").unwrap(),
            Value::Date(date(2024, 3, 1))
        );
    }

    #[test]
    fn test_iso8601_display() {
        let v = Value::Date(date(2025, 1, 1));
        assert_eq!(iso8601(&v).unwrap(), "2025-01-01T00:00:00+00:00");
    }
}
