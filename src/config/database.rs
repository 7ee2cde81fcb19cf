//! Database URI parsing.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the company store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Private in-memory database, gone when the process exits.
    Memory,
    /// `SQLite` database file.
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parses a database URI.
    ///
    /// Accepted forms follow the `SQLAlchemy` convention:
    ///
    /// | URI | Location |
    /// |-----|----------|
    /// | `sqlite://`, `sqlite://:memory:`, `:memory:` | in memory |
    /// | `sqlite:///companies.db` | `companies.db` (relative) |
    /// | `sqlite:////var/lib/registry.db` | `/var/lib/registry.db` |
    /// | `sqlite://data/companies.db` | `data/companies.db` |
    /// | `data/companies.db` | plain path |
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty URI or a non-`sqlite` scheme.
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::InvalidInput("database URI is empty".to_string()));
        }

        let Some(rest) = uri.strip_prefix("sqlite:") else {
            if let Some((scheme, _)) = uri.split_once("://") {
                return Err(Error::InvalidInput(format!(
                    "unsupported database scheme '{scheme}' (only sqlite is supported)"
                )));
            }
            return Ok(Self::from_path(uri));
        };

        let path = match rest.strip_prefix("//") {
            // sqlite:///relative.db keeps one slash as the separator
            Some(after) => after.strip_prefix('/').unwrap_or(after),
            None => rest,
        };

        if path.is_empty() {
            return Ok(Self::Memory);
        }
        Ok(Self::from_path(path))
    }

    fn from_path(path: &str) -> Self {
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::File(PathBuf::from(path))
        }
    }

    /// Returns `true` for an in-memory database.
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl FromStr for DatabaseLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, ":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("sqlite://:memory:" ; "sqlite memory")]
    #[test_case("sqlite::memory:" ; "short sqlite memory")]
    #[test_case(":memory:" ; "bare memory")]
    #[test_case("sqlite://" ; "empty sqlite path")]
    fn test_parse_memory(uri: &str) {
        assert_eq!(DatabaseLocation::parse(uri).unwrap(), DatabaseLocation::Memory);
    }

    #[test_case("sqlite:///companies.db", "companies.db" ; "relative triple slash")]
    #[test_case("sqlite:////var/lib/registry.db", "/var/lib/registry.db" ; "absolute")]
    #[test_case("sqlite://data/companies.db", "data/companies.db" ; "double slash")]
    #[test_case("data/companies.db", "data/companies.db" ; "plain path")]
    #[test_case("  ./x.db ", "./x.db" ; "trimmed")]
    fn test_parse_file(uri: &str, expected: &str) {
        assert_eq!(
            DatabaseLocation::parse(uri).unwrap(),
            DatabaseLocation::File(PathBuf::from(expected))
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("postgres://localhost/db" ; "other scheme")]
    fn test_parse_rejects(uri: &str) {
        assert!(matches!(
            DatabaseLocation::parse(uri),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(DatabaseLocation::Memory.to_string(), ":memory:");
        assert!(DatabaseLocation::Memory.is_memory());
        let file: DatabaseLocation = "sqlite:///a.db".parse().unwrap();
        assert_eq!(file.to_string(), "a.db");
    }
}
