//! Core traits for import/export operations.
//!
//! Defines the [`ImportSource`] and [`ExportSink`] traits that format adapters
//! implement to support different file formats.

use crate::Result;
use crate::models::{Company, FieldMap};

/// Row-level key for problems that belong to no single field.
pub const ROW_ERROR_KEY: &str = "_row";

/// Message for a JSON array element that is not an object.
pub const NOT_AN_OBJECT: &str = "Row must be a JSON object.";

/// One record read from an import payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportRecord {
    /// A record keyed by field name, still untyped.
    Fields(FieldMap),
    /// A record the format could read but not turn into fields.
    ///
    /// Reported as a row error; the rest of the payload is still imported.
    Malformed(&'static str),
}

/// Source of imported company records.
///
/// Implementations read records from a specific format (CSV, JSON) and yield
/// them one at a time in payload order.
///
/// # Errors vs. malformed records
///
/// A payload that cannot be read as a whole (invalid JSON, a CSV record
/// with the wrong number of fields, a missing `name` column) is an
/// [`Error::Parse`](crate::Error::Parse) from [`ImportSource::next`]. A
/// readable record with the wrong shape is [`ImportRecord::Malformed`].
pub trait ImportSource {
    /// Reads the next record from the source.
    ///
    /// Returns `Ok(None)` when the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the payload is malformed.
    fn next(&mut self) -> Result<Option<ImportRecord>>;

    /// Returns an estimate of the total number of records.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Sink for exported companies.
///
/// # Lifecycle
///
/// 1. Create sink with output destination
/// 2. Call `write()` for each company
/// 3. Call `finalize()` to complete the export
pub trait ExportSink {
    /// Writes a single company to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails.
    fn write(&mut self, company: &Company) -> Result<()>;

    /// Finalizes the export, writing any footers and flushing buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}
