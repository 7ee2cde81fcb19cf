//! Company export service.
//!
//! Streams every stored company into a format sink, parents ahead of their
//! children, so the output re-imports into an empty store.

use crate::io::formats::{Format, create_export_sink};
use crate::io::traits::ExportSink;
use crate::storage::CompanyStore;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Result of an export operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Number of companies exported.
    pub exported: usize,
    /// Format used for export.
    pub format: Format,
    /// Output path (if file export).
    pub output_path: Option<PathBuf>,
}

impl ExportResult {
    /// Creates a new export result.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            exported: 0,
            format,
            output_path: None,
        }
    }

    /// Returns whether any companies were exported.
    #[must_use]
    pub const fn has_exports(&self) -> bool {
        self.exported > 0
    }
}

/// Service for exporting companies to CSV or JSON.
pub struct ExportService {
    store: Arc<dyn CompanyStore>,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    /// Exports all companies to a file.
    ///
    /// The format is taken from the file extension when not given.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unknown or the file cannot be written.
    pub fn export_to_file(&self, path: &Path, format: Option<Format>) -> Result<ExportResult> {
        let format = match format {
            Some(format) => format,
            None => Format::from_path(path)?,
        };

        let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let mut result = self.export_to_writer(std::io::BufWriter::new(file), format)?;
        result.output_path = Some(path.to_path_buf());
        Ok(result)
    }

    /// Exports all companies to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the writer fails.
    pub fn export_to_writer<W: Write>(&self, writer: W, format: Format) -> Result<ExportResult> {
        let sink = create_export_sink(writer, format)?;
        self.export_to_sink(sink, format)
    }

    /// Exports all companies into an already created sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the sink fails.
    #[instrument(skip(self, sink), fields(operation = "export", format = %format))]
    pub fn export_to_sink(
        &self,
        mut sink: Box<dyn ExportSink + '_>,
        format: Format,
    ) -> Result<ExportResult> {
        let start = Instant::now();
        let companies = self.store.list_parents_first()?;

        let mut result = ExportResult::new(format);
        for company in &companies {
            sink.write(company)?;
            result.exported += 1;
        }
        sink.finalize()?;

        metrics::counter!("company_export_total", "format" => format.extension()).increment(1);
        metrics::histogram!("company_export_duration_ms", "format" => format.extension())
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(exported = result.exported, "Export finished");

        Ok(result)
    }

    /// Exports all companies into a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or serialization fails.
    pub fn export_bytes(&self, format: Format) -> Result<(Vec<u8>, ExportResult)> {
        let mut buffer = Vec::new();
        let result = self.export_to_writer(&mut buffer, format)?;
        Ok((buffer, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, CompanyFields, CompanyId};
    use crate::storage::SqliteCompanyStore;

    fn seeded_store() -> Arc<dyn CompanyStore> {
        let store = SqliteCompanyStore::in_memory().unwrap();
        let parent = store
            .create_with_id(CompanyId::new("p"), CompanyFields::new("Parent"))
            .unwrap();
        store
            .create(CompanyFields::new("Child").with_parent(parent.id))
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_export_json_parents_first() {
        let service = ExportService::new(seeded_store());
        let (bytes, result) = service.export_bytes(Format::Json).unwrap();

        assert_eq!(result.exported, 2);
        assert!(result.has_exports());
        let companies: Vec<Company> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(companies[0].name, "Parent");
        assert_eq!(companies[1].parent_id, Some(CompanyId::new("p")));
    }

    #[test]
    fn test_export_puts_reparented_child_after_parent() {
        let store = SqliteCompanyStore::in_memory().unwrap();
        let child = store.create(CompanyFields::new("Child")).unwrap();
        let parent = store.create(CompanyFields::new("Parent")).unwrap();
        store
            .replace(&child.id, CompanyFields::new("Child").with_parent(parent.id))
            .unwrap();

        let (bytes, _) = ExportService::new(Arc::new(store))
            .export_bytes(Format::Json)
            .unwrap();
        let companies: Vec<Company> = serde_json::from_slice(&bytes).unwrap();
        let names: Vec<&str> = companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Parent", "Child"]);
    }

    #[test]
    fn test_export_csv_rows() {
        let service = ExportService::new(seeded_store());
        let (bytes, result) = service.export_bytes(Format::Csv).unwrap();

        assert_eq!(result.format, Format::Csv);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("p,Parent,"));
    }

    #[test]
    fn test_export_empty_store() {
        let service = ExportService::new(Arc::new(SqliteCompanyStore::in_memory().unwrap()));
        let (bytes, result) = service.export_bytes(Format::Json).unwrap();
        assert!(!result.has_exports());
        assert_eq!(bytes, b"[]\n");
    }

    #[test]
    fn test_export_to_file() {
        let service = ExportService::new(seeded_store());
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("companies.csv");

        let result = service.export_to_file(&path, None).unwrap();
        assert_eq!(result.output_path.as_deref(), Some(path.as_path()));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,name,"));

        let bad = dir.path().join("companies.xml");
        assert!(service.export_to_file(&bad, None).is_err());
    }
}
