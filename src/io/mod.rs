//! Import/Export I/O subsystem.
//!
//! Bulk company import with per-row outcomes, and full export.
//!
//! # Architecture
//!
//! - **Format adapters** implement [`ImportSource`] and [`ExportSink`]
//! - **Services** drive parsing, validation, and storage
//!
//! # Supported Formats
//!
//! | Format | Import | Export | Notes |
//! |--------|--------|--------|-------|
//! | CSV | ✓ | ✓ | Header row required; empty cells are null |
//! | JSON | ✓ | ✓ | Top level is an array of objects |
//!
//! # Examples
//!
//! ```rust,ignore
//! use company_registry::io::{Format, ImportService};
//!
//! let report = imports.import_bytes(b"name\nAcme\n", Format::Csv)?;
//! assert_eq!(report.succeeded, 1);
//! ```

pub mod formats;
pub mod services;
pub mod traits;

pub use formats::Format;
pub use services::export::{ExportResult, ExportService};
pub use services::import::{ImportReport, ImportService, ImportStatus, RowError};
pub use traits::{ExportSink, ImportRecord, ImportSource, ROW_ERROR_KEY};
