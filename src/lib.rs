//! # Company Registry
//!
//! A REST service for company records arranged in a parent/child hierarchy.
//!
//! The registry stores companies in `SQLite`, validates every write against
//! field and referential rules, and moves data in and out in bulk:
//!
//! - CRUD over `/companies` with full replace and partial update
//! - Hierarchy queries (children, ancestor chain) with cycle prevention
//! - CSV and JSON import with per-row errors and partial-success reporting
//! - CSV and JSON export that the importer reads back unchanged
//!
//! ## Example
//!
//! ```rust,ignore
//! use company_registry::services::CompanyService;
//! use company_registry::storage::SqliteCompanyStore;
//!
//! let store = Arc::new(SqliteCompanyStore::in_memory()?);
//! let companies = CompanyService::new(store, CompanyValidator::default());
//! let acme = companies.create(&serde_json::from_str(r#"{"name": "Acme"}"#)?)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod api;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use config::RegistryConfig;
pub use models::{Company, CompanyDraft, CompanyField, CompanyFields, CompanyId, FieldMap};
pub use services::CompanyService;
pub use storage::{CompanyStore, SqliteCompanyStore};
pub use validation::{CompanyValidator, ValidationErrors, ValidationMode};

/// Error type for registry operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | HTTP |
/// |---------|-------------|------|
/// | `NotFound` | Unknown company id on get/replace/patch/delete | 404 |
/// | `Validation` | Field, type or referential rule violated | 400 |
/// | `Parse` | Import payload is not readable as a whole | 400 |
/// | `InvalidInput` | Request shape problems, unknown format, bad config | 400 |
/// | `OperationFailed` | Database or filesystem failure | 500 |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Input failed validation.
    ///
    /// Carries every failing field, not just the first.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An import payload could not be parsed.
    ///
    /// Raised before any row is processed:
    /// - CSV is malformed or lacks a `name` header
    /// - JSON is invalid or its top level is not an array
    #[error("invalid {format} file: {message}")]
    Parse {
        /// Format being parsed (`CSV`, `JSON`).
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A multipart upload has no `file` part or an empty filename
    /// - A format name or file extension is not recognized
    /// - A configuration value cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - Filesystem I/O errors occur
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Creates a not-found error for a company.
    #[must_use]
    pub fn company_not_found(id: &CompanyId) -> Self {
        Self::NotFound {
            entity: "company",
            id: id.to_string(),
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current UTC time truncated to microseconds.
///
/// Stored timestamps carry microsecond precision, so values handed out by
/// the store compare equal to what it reads back.
///
/// # Examples
///
/// ```rust
/// use chrono::Timelike;
/// use company_registry::current_timestamp;
///
/// let ts = current_timestamp();
/// assert_eq!(ts.nanosecond() % 1_000, 0);
/// ```
#[must_use]
pub fn current_timestamp() -> chrono::DateTime<chrono::Utc> {
    use chrono::SubsecRound;
    chrono::Utc::now().trunc_subsecs(6)
}
