//! Engine configuration
//!
//! One process-wide configuration, installed at most once. Until something is
//! installed, every reader sees `EngineConfig::default()`.
//!
//! Sources:
//! - JSON file (`EngineConfig::from_file`)
//! - `RECORDCAST_*` environment variables (`EngineConfig::from_env`)
//! - code (`EngineConfig::default()` plus struct update syntax)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{Error, Result};
use crate::format::DEFAULT_PATTERN;
use crate::observability::{Event, Logger, Severity};

/// Environment variable overriding `default_format`
pub const ENV_DEFAULT_FORMAT: &str = "RECORDCAST_DEFAULT_FORMAT";
/// Environment variable overriding `log_level`
pub const ENV_LOG_LEVEL: &str = "RECORDCAST_LOG_LEVEL";
/// Environment variable overriding `strict_nested_groups`
pub const ENV_STRICT_NESTED_GROUPS: &str = "RECORDCAST_STRICT_NESTED_GROUPS";

static INSTALLED: OnceLock<EngineConfig> = OnceLock::new();

/// Configuration for the marshalling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Date-time pattern used when neither the field nor the schema declares one.
    pub default_format: String,
    /// Minimum severity written by the logger.
    pub log_level: Severity,
    /// Require nested record types to declare every non-default group they are
    /// resolved under, instead of falling back to empty groups.
    pub strict_nested_groups: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_format: DEFAULT_PATTERN.to_string(),
            log_level: Severity::Warn,
            strict_nested_groups: false,
        }
    }
}

impl EngineConfig {
    /// Config that logs every engine decision.
    pub fn verbose() -> Self {
        Self {
            log_level: Severity::Trace,
            ..Self::default()
        }
    }

    /// Loads a config from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Loads a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Loads a config from `(name, value)` pairs shaped like environment variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();
        for (name, value) in vars {
            match name.as_str() {
                ENV_DEFAULT_FORMAT => config.default_format = value,
                ENV_LOG_LEVEL => {
                    config.log_level = Severity::parse(&value).ok_or_else(|| {
                        Error::Config(format!("{}: unknown severity '{}'", ENV_LOG_LEVEL, value))
                    })?;
                }
                ENV_STRICT_NESTED_GROUPS => {
                    config.strict_nested_groups = parse_flag(&value).ok_or_else(|| {
                        Error::Config(format!(
                            "{}: expected true/false, got '{}'",
                            ENV_STRICT_NESTED_GROUPS, value
                        ))
                    })?;
                }
                _ => {}
            }
        }
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.default_format.trim().is_empty() {
            return Err(Error::Config("default_format must not be empty".into()));
        }
        Ok(())
    }

    /// Installs this config process-wide and applies its log level.
    ///
    /// Returns the rejected config if one was already installed.
    pub fn install(self) -> std::result::Result<(), EngineConfig> {
        let level = self.log_level;
        INSTALLED.set(self)?;
        Logger::set_min_severity(level);
        Event::ConfigInstalled.emit(&[("log_level", level.as_str())]);
        Ok(())
    }
}

/// The installed config, or the defaults.
pub fn current() -> &'static EngineConfig {
    static DEFAULT: OnceLock<EngineConfig> = OnceLock::new();
    INSTALLED
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(EngineConfig::default))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_format, "Y-m-d\\TH:i:s");
        assert_eq!(config.log_level, Severity::Warn);
        assert!(!config.strict_nested_groups);
    }

    #[test]
    fn test_config_verbose() {
        assert_eq!(EngineConfig::verbose().log_level, Severity::Trace);
    }

    #[test]
    fn test_config_from_vars() {
        let config = EngineConfig::from_vars(vars(&[
            (ENV_DEFAULT_FORMAT, "Y-m-d"),
            (ENV_LOG_LEVEL, "trace"),
            (ENV_STRICT_NESTED_GROUPS, "yes"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();
        assert_eq!(config.default_format, "Y-m-d");
        assert_eq!(config.log_level, Severity::Trace);
        assert!(config.strict_nested_groups);
    }

    #[test]
    fn test_config_from_vars_rejects_bad_level() {
        let err = EngineConfig::from_vars(vars(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_from_file_keeps_missing_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"log_level": "ERROR"}}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, Severity::Error);
        assert_eq!(config.default_format, DEFAULT_PATTERN);
    }

    #[test]
    fn test_config_from_file_rejects_empty_format() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_format": "  "}}"#).unwrap();
        assert!(EngineConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_current_falls_back_to_defaults() {
        assert!(!current().default_format.is_empty());
    }
}
