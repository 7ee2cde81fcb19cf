//! Format adapters for import/export.
//!
//! Each format implements [`ImportSource`] and [`ExportSink`].

pub mod csv;
pub mod json;

use crate::{Error, Result};
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use super::traits::{ExportSink, ImportSource};

/// Supported file formats for import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// CSV with a header row.
    Csv,
    /// JSON array of objects.
    Json,
}

impl Format {
    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Json]
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// Returns the label used in parse errors (`CSV`, `JSON`).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
        }
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some(ext) => Err(Error::InvalidInput(format!(
                "Unsupported file extension: .{ext}"
            ))),
            None => Err(Error::InvalidInput(
                "Cannot determine format: file has no extension".to_string(),
            )),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(Error::InvalidInput(format!("Unknown format: {s}"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Creates an import source for the given format and reader.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the payload header cannot be read.
pub fn create_import_source<'a, R: Read + 'a>(
    reader: R,
    format: Format,
) -> Result<Box<dyn ImportSource + 'a>> {
    match format {
        Format::Csv => Ok(Box::new(csv::CsvImportSource::new(reader)?)),
        Format::Json => Ok(Box::new(json::JsonImportSource::new(reader)?)),
    }
}

/// Creates an export sink for the given format and writer.
///
/// # Errors
///
/// Returns an error if sink creation fails.
pub fn create_export_sink<'a, W: Write + 'a>(
    writer: W,
    format: Format,
) -> Result<Box<dyn ExportSink + 'a>> {
    match format {
        Format::Csv => Ok(Box::new(csv::CsvExportSink::new(writer))),
        Format::Json => Ok(Box::new(json::JsonExportSink::new(writer))),
    }
}

/// Builds an [`Error::Parse`] for `format`.
pub(crate) fn parse_error(format: Format, message: impl std::fmt::Display) -> Error {
    Error::Parse {
        format: format.label(),
        message: message.to_string(),
    }
}

/// Builds an [`Error::OperationFailed`] for a write failure.
pub(crate) fn write_error(operation: &str, cause: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("json").unwrap(), Format::Json);
        assert_eq!(Format::from_str("CSV").unwrap(), Format::Csv);
        assert!(Format::from_str("yaml").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            Format::from_path(Path::new("companies.json")).unwrap(),
            Format::Json
        );
        assert_eq!(
            Format::from_path(Path::new("EXPORT.CSV")).unwrap(),
            Format::Csv
        );
        assert!(Format::from_path(Path::new("companies.txt")).is_err());
        assert!(Format::from_path(Path::new("companies")).is_err());
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(Format::Csv.extension(), "csv");
        assert_eq!(Format::Csv.mime_type(), "text/csv");
        assert_eq!(Format::Json.label(), "JSON");
        assert_eq!(Format::Json.to_string(), "json");
        assert_eq!(Format::all().len(), 2);
    }
}
