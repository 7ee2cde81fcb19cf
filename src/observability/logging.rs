//! Structured logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!(
                "unknown log format '{other}' (expected pretty or json)"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Optional log file (append mode).
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the logging configuration from settings.
    ///
    /// Filter precedence: the configured directive, then `RUST_LOG`, then
    /// `debug` when `verbose` is set, otherwise `info`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configured filter directive is invalid.
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Result<Self> {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let filter = match settings.filter.as_deref() {
            Some(directive) => EnvFilter::try_new(directive).map_err(|e| {
                Error::InvalidInput(format!("invalid log filter '{directive}': {e}"))
            })?,
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        };

        Ok(Self {
            format: settings.format,
            filter,
            file: settings.file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_from_settings_uses_configured_filter() {
        let settings = LoggingSettings {
            format: LogFormat::Json,
            filter: Some("company_registry=trace".to_string()),
            file: None,
        };
        let config = LoggingConfig::from_settings(&settings, false).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.filter.to_string().contains("company_registry"));
    }

    #[test]
    fn test_from_settings_rejects_bad_filter() {
        let settings = LoggingSettings {
            filter: Some("company_registry=loud".to_string()),
            ..LoggingSettings::default()
        };
        assert!(LoggingConfig::from_settings(&settings, true).is_err());
    }
}
