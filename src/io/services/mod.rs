//! Import and export service implementations.
//!
//! Orchestrates format parsing, validation, and storage operations.

pub mod export;
pub mod import;

pub use export::{ExportResult, ExportService};
pub use import::{ImportReport, ImportService, ImportStatus, RowError};
