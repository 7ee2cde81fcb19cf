//! Company import service.
//!
//! Parses a whole payload, then validates and upserts each row on its own.
//! One row's failure never stops or rolls back another row.

use crate::io::formats::{Format, create_import_source};
use crate::io::traits::{ImportRecord, ImportSource, ROW_ERROR_KEY};
use crate::services::{CompanyService, UpsertOutcome};
use crate::validation::ValidationErrors;
use crate::{Error, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Outcome class of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// Every row was stored (also for an empty payload).
    Complete,
    /// Some rows were stored, some failed.
    Partial,
    /// Every row failed.
    Failed,
}

impl ImportStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Errors for one import row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// Zero-based position of the row in the payload.
    pub index: usize,
    /// Failing fields and their messages.
    pub errors: ValidationErrors,
}

/// Result of an import operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows read from the payload.
    pub processed: usize,
    /// Rows stored.
    pub succeeded: usize,
    /// Rows rejected.
    pub failed: usize,
    /// Stored rows that created a company.
    pub created: usize,
    /// Stored rows that replaced a company.
    pub updated: usize,
    /// Row errors ordered by index.
    pub errors: Vec<RowError>,
}

impl ImportReport {
    /// Classifies the report.
    ///
    /// | Rows | Status |
    /// |------|--------|
    /// | none failed (including no rows) | `Complete` |
    /// | some failed | `Partial` |
    /// | all failed | `Failed` |
    #[must_use]
    pub const fn status(&self) -> ImportStatus {
        if self.failed == 0 {
            ImportStatus::Complete
        } else if self.failed < self.processed {
            ImportStatus::Partial
        } else {
            ImportStatus::Failed
        }
    }

    /// Returns a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.status() {
            ImportStatus::Complete => {
                format!("{} records imported successfully.", self.succeeded)
            },
            ImportStatus::Partial | ImportStatus::Failed => {
                format!("{} records imported, {} errors.", self.succeeded, self.failed)
            },
        }
    }

    fn record_success(&mut self, outcome: &UpsertOutcome) {
        self.succeeded += 1;
        if outcome.is_created() {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }

    fn record_failure(&mut self, index: usize, errors: ValidationErrors) {
        self.failed += 1;
        self.errors.push(RowError { index, errors });
    }
}

/// Service for importing companies from CSV and JSON payloads.
pub struct ImportService {
    companies: Arc<CompanyService>,
}

impl ImportService {
    /// Creates a new import service.
    #[must_use]
    pub const fn new(companies: Arc<CompanyService>) -> Self {
        Self { companies }
    }

    /// Imports an in-memory payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the payload cannot be read as a whole;
    /// row failures are reported in the [`ImportReport`].
    pub fn import_bytes(&self, payload: &[u8], format: Format) -> Result<ImportReport> {
        self.import_from_reader(payload, format)
    }

    /// Imports a file, detecting the format from its extension when not given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, the format is unknown,
    /// or the payload cannot be parsed.
    pub fn import_from_file(&self, path: &Path, format: Option<Format>) -> Result<ImportReport> {
        let format = match format {
            Some(format) => format,
            None => Format::from_path(path)?,
        };

        let file = std::fs::File::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_import_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        self.import_from_reader(std::io::BufReader::new(file), format)
    }

    /// Imports from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the payload cannot be read as a whole.
    pub fn import_from_reader<R: Read>(&self, reader: R, format: Format) -> Result<ImportReport> {
        let mut source = create_import_source(reader, format)?;
        self.import_from_source(source.as_mut(), format)
    }

    /// Imports every record of a source.
    ///
    /// The source is drained before any row is written, so a parse error
    /// anywhere in the payload leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the source fails.
    #[instrument(skip(self, source), fields(operation = "import", format = %format))]
    pub fn import_from_source(
        &self,
        source: &mut dyn ImportSource,
        format: Format,
    ) -> Result<ImportReport> {
        let start = Instant::now();

        let mut records = Vec::with_capacity(source.size_hint().unwrap_or_default());
        while let Some(record) = source.next()? {
            records.push(record);
        }

        let mut report = ImportReport {
            processed: records.len(),
            ..ImportReport::default()
        };

        for (index, record) in records.into_iter().enumerate() {
            let fields = match record {
                ImportRecord::Fields(fields) => fields,
                ImportRecord::Malformed(message) => {
                    report.record_failure(index, ValidationErrors::single(ROW_ERROR_KEY, message));
                    continue;
                },
            };

            match self.companies.import_row(&fields) {
                Ok(outcome) => {
                    let id = &outcome.company().id;
                    tracing::debug!(index, company.id = %id, "Import row stored");
                    report.record_success(&outcome);
                },
                Err(Error::Validation(errors)) => {
                    tracing::debug!(index, errors = %errors, "Import row rejected");
                    report.record_failure(index, errors);
                },
                Err(e) => {
                    tracing::warn!(index, error = %e, "Import row failed");
                    report.record_failure(
                        index,
                        ValidationErrors::single(ROW_ERROR_KEY, "Row could not be stored."),
                    );
                },
            }
        }

        let status = report.status();
        metrics::counter!(
            "company_import_rows_total",
            "format" => format.extension(),
            "result" => "succeeded"
        )
        .increment(report.succeeded as u64);
        metrics::counter!(
            "company_import_rows_total",
            "format" => format.extension(),
            "result" => "failed"
        )
        .increment(report.failed as u64);
        metrics::histogram!(
            "company_import_duration_ms",
            "format" => format.extension(),
            "status" => status.as_str()
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            created = report.created,
            updated = report.updated,
            status = status.as_str(),
            "Import finished"
        );

        Ok(report)
    }
}
