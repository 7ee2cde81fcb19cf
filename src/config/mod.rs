//! Configuration management.
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>` or `<config dir>/company-registry/config.toml`)
//! 3. Environment variables (a `.env` file is loaded by the binary first)
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `REGISTRY_ENV` | `environment` |
//! | `REGISTRY_DEBUG` | `debug` |
//! | `DATABASE_URI` | `database.uri` |
//! | `REGISTRY_HOST` / `REGISTRY_PORT` | `server.host` / `server.port` |
//! | `REGISTRY_MAX_UPLOAD_BYTES` | `server.max_upload_bytes` |
//! | `REGISTRY_LOG_FORMAT` / `REGISTRY_LOG_FILTER` / `REGISTRY_LOG_FILE` | `logging.*` |
//! | `REGISTRY_METRICS_ENABLED` / `REGISTRY_METRICS_PORT` | `metrics.*` |

mod database;

pub use database::DatabaseLocation;

use crate::observability::LogFormat;
use crate::validation::FieldLimits;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database URI.
pub const DEFAULT_DATABASE_URI: &str = "sqlite:///companies.db";

/// Default upload size limit for import requests (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Main configuration for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Deployment environment name (`production`, `development`, ...).
    pub environment: String,
    /// Debug mode flag, reported by `/config`.
    pub debug: bool,
    /// Database settings.
    pub database: DatabaseSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Field length limits.
    pub limits: FieldLimits,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
}

/// Database settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Database URI, see [`DatabaseLocation::parse`].
    pub uri: String,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Maximum request body size for uploads.
    pub max_upload_bytes: usize,
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` applies when unset.
    pub filter: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Metrics settings.
#[derive(Debug, Clone)]
pub struct MetricsSettings {
    /// Whether the Prometheus exporter is installed.
    pub enabled: bool,
    /// Port for the Prometheus scrape listener.
    pub port: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            debug: false,
            database: DatabaseSettings {
                uri: DEFAULT_DATABASE_URI.to_string(),
            },
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            limits: FieldLimits::default(),
            logging: LoggingSettings::default(),
            metrics: MetricsSettings {
                enabled: false,
                port: 9090,
            },
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Environment name.
    pub environment: Option<String>,
    /// Debug flag.
    pub debug: Option<bool>,
    /// Database section.
    pub database: Option<ConfigFileDatabase>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Field limits; omitted keys keep their defaults.
    pub limits: Option<FieldLimits>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Database section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDatabase {
    /// Database URI.
    pub uri: Option<String>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Upload size limit.
    pub max_upload_bytes: Option<usize>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<LogFormat>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Exporter enabled.
    pub enabled: Option<bool>,
    /// Listener port.
    pub port: Option<u16>,
}

/// The `/config` response body.
///
/// Key names are fixed for client compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    /// Environment name.
    #[serde(rename = "FLASK_ENV")]
    pub environment: String,
    /// Debug flag.
    #[serde(rename = "DEBUG")]
    pub debug: bool,
    /// Configured database URI.
    #[serde(rename = "DATABASE_URI")]
    pub database_uri: String,
}

impl RegistryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| {
            Error::InvalidInput(format!("config file {}: {e}", path.display()))
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Looks for `company-registry/config.toml` under the platform config
    /// directory (`~/.config` on Linux, `~/Library/Application Support` on
    /// macOS). Returns defaults if there is no readable file.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Returns the default config file path, if a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| {
            dirs.config_dir()
                .join("company-registry")
                .join("config.toml")
        })
    }

    /// Loads the file layer (explicit path or default location), then
    /// applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Converts a `ConfigFile` to `RegistryConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(environment) = file.environment {
            config.environment = environment;
        }
        if let Some(debug) = file.debug {
            config.debug = debug;
        }
        if let Some(uri) = file.database.and_then(|db| db.uri) {
            config.database.uri = uri;
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(max) = server.max_upload_bytes {
                config.server.max_upload_bytes = max;
            }
        }
        if let Some(limits) = file.limits {
            config.limits = limits;
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format;
            }
            config.logging.filter = logging.filter;
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            if let Some(enabled) = metrics.enabled {
                config.metrics.enabled = enabled;
            }
            if let Some(port) = metrics.port {
                config.metrics.port = port;
            }
        }

        config
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an unparseable value.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_with(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an unparseable value.
    pub fn apply_env_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(environment) = var("REGISTRY_ENV") {
            self.environment = environment;
        }
        if let Some(debug) = var("REGISTRY_DEBUG") {
            self.debug = parse_bool("REGISTRY_DEBUG", &debug)?;
        }
        if let Some(uri) = var("DATABASE_URI") {
            self.database.uri = uri;
        }
        if let Some(host) = var("REGISTRY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("REGISTRY_PORT") {
            self.server.port = parse_number("REGISTRY_PORT", &port)?;
        }
        if let Some(max) = var("REGISTRY_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_number("REGISTRY_MAX_UPLOAD_BYTES", &max)?;
        }
        if let Some(format) = var("REGISTRY_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(filter) = var("REGISTRY_LOG_FILTER") {
            self.logging.filter = Some(filter);
        }
        if let Some(file) = var("REGISTRY_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = var("REGISTRY_METRICS_ENABLED") {
            self.metrics.enabled = parse_bool("REGISTRY_METRICS_ENABLED", &enabled)?;
        }
        if let Some(port) = var("REGISTRY_METRICS_PORT") {
            self.metrics.port = parse_number("REGISTRY_METRICS_PORT", &port)?;
        }

        Ok(())
    }

    /// Checks values that cannot be expressed in the types alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unusable database URI or a zero
    /// upload limit.
    pub fn validate(&self) -> Result<()> {
        self.database_location()?;
        if self.server.max_upload_bytes == 0 {
            return Err(Error::InvalidInput(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses the configured database URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the URI is not a supported form.
    pub fn database_location(&self) -> Result<DatabaseLocation> {
        DatabaseLocation::parse(&self.database.uri)
    }

    /// Returns `host:port` for the HTTP listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Builds the `/config` snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            environment: self.environment.clone(),
            debug: self.debug,
            database_uri: self.database.uri.clone(),
        }
    }

    /// Sets the database URI.
    #[must_use]
    pub fn with_database_uri(mut self, uri: impl Into<String>) -> Self {
        self.database.uri = uri.into();
        self
    }

    /// Sets the environment name.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{key}: expected a boolean, got '{value}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key}: expected a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.environment, "production");
        assert!(!config.debug);
        assert_eq!(config.database.uri, DEFAULT_DATABASE_URI);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.limits.name, 100);
        assert!(!config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
environment = "development"
debug = true

[database]
uri = "sqlite://:memory:"

[server]
port = 8080

[limits]
name = 50

[logging]
format = "json"
filter = "company_registry=trace"

[metrics]
enabled = true
port = 9100
"#
        )
        .unwrap();

        let config = RegistryConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.environment, "development");
        assert!(config.debug);
        assert_eq!(config.database_location().unwrap(), DatabaseLocation::Memory);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.limits.name, 50);
        assert_eq!(config.limits.description, 500);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.filter.as_deref(),
            Some("company_registry=trace")
        );
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9100);
    }

    #[test]
    fn test_load_from_file_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "colour = \"blue\"").unwrap();
        assert!(matches!(
            RegistryConfig::load_from_file(file.path()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = RegistryConfig::load(Some(Path::new("/nonexistent/registry.toml")));
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = RegistryConfig::default().with_environment("development");
        config
            .apply_env_overrides_with(env(&[
                ("REGISTRY_ENV", "testing"),
                ("REGISTRY_DEBUG", "yes"),
                ("DATABASE_URI", "sqlite:///tmp.db"),
                ("REGISTRY_PORT", "8081"),
                ("REGISTRY_MAX_UPLOAD_BYTES", "1024"),
                ("REGISTRY_LOG_FORMAT", "json"),
                ("REGISTRY_METRICS_ENABLED", "1"),
                ("REGISTRY_HOST", "   "),
            ]))
            .unwrap();

        assert_eq!(config.environment, "testing");
        assert!(config.debug);
        assert_eq!(config.database.uri, "sqlite:///tmp.db");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.max_upload_bytes, 1024);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
        // blank values are ignored
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
    }

    #[test]
    fn test_env_invalid_values_are_reported() {
        let mut config = RegistryConfig::default();
        let err = config
            .apply_env_overrides_with(env(&[("REGISTRY_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("REGISTRY_PORT"));

        let err = config
            .apply_env_overrides_with(env(&[("REGISTRY_DEBUG", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("REGISTRY_DEBUG"));
    }

    #[test]
    fn test_validate_rejects_bad_uri_and_zero_limit() {
        let config = RegistryConfig::default().with_database_uri("mysql://db");
        assert!(config.validate().is_err());

        let mut config = RegistryConfig::default();
        config.server.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_keys() {
        let config = RegistryConfig::default()
            .with_environment("development")
            .with_database_uri("sqlite://:memory:");
        let json = serde_json::to_value(config.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "FLASK_ENV": "development",
                "DEBUG": false,
                "DATABASE_URI": "sqlite://:memory:"
            })
        );
    }
}
