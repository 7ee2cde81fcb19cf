//! JSON format adapter for import/export.
//!
//! Import reads a single JSON array; export writes one.

use super::{Format, parse_error, write_error};
use crate::io::traits::{ExportSink, ImportRecord, ImportSource, NOT_AN_OBJECT};
use crate::models::Company;
use crate::Result;
use serde_json::Value;
use std::io::{Read, Write};

/// JSON import source.
///
/// The payload is parsed up front; elements that are not objects are
/// yielded as [`ImportRecord::Malformed`].
pub struct JsonImportSource {
    elements: std::vec::IntoIter<Value>,
    total: usize,
}

impl JsonImportSource {
    /// Parses a JSON array payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the payload is not
    /// valid JSON or its top level is not an array.
    pub fn new<R: Read>(reader: R) -> Result<Self> {
        let value: Value =
            serde_json::from_reader(reader).map_err(|e| parse_error(Format::Json, e))?;

        let Value::Array(elements) = value else {
            return Err(parse_error(
                Format::Json,
                "top level must be an array of objects",
            ));
        };

        Ok(Self {
            total: elements.len(),
            elements: elements.into_iter(),
        })
    }
}

impl ImportSource for JsonImportSource {
    fn next(&mut self) -> Result<Option<ImportRecord>> {
        Ok(self.elements.next().map(|element| match element {
            Value::Object(map) => ImportRecord::Fields(map),
            _ => ImportRecord::Malformed(NOT_AN_OBJECT),
        }))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// JSON export sink.
///
/// Writes a JSON array of company objects.
pub struct JsonExportSink<W: Write> {
    writer: W,
    /// Number of records written.
    count: usize,
}

impl<W: Write> JsonExportSink<W> {
    /// Creates a new JSON export sink.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }
}

impl<W: Write> ExportSink for JsonExportSink<W> {
    fn write(&mut self, company: &Company) -> Result<()> {
        let separator: &[u8] = if self.count == 0 { b"[\n" } else { b",\n" };
        self.writer
            .write_all(separator)
            .map_err(|e| write_error("write_json", e))?;
        serde_json::to_writer(&mut self.writer, company)
            .map_err(|e| write_error("write_json", e))?;
        self.count += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        let footer: &[u8] = if self.count == 0 { b"[]\n" } else { b"\n]\n" };
        self.writer
            .write_all(footer)
            .map_err(|e| write_error("write_json", e))?;
        self.writer
            .flush()
            .map_err(|e| write_error("flush_json", e))
    }
}
