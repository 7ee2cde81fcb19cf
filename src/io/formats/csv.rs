//! CSV format adapter for import/export.
//!
//! The export header is the full field list in column order, and the import
//! accepts that file unchanged.

use super::{Format, parse_error, write_error};
use crate::io::traits::{ExportSink, ImportRecord, ImportSource};
use crate::models::{Company, CompanyField, FieldMap};
use crate::Result;
use chrono::SecondsFormat;
use serde_json::Value;
use std::io::{Read, Write};

/// CSV import source.
///
/// The first row is the header; header names are the field names. Every
/// record must have as many cells as the header. Empty cells become `null`.
pub struct CsvImportSource<R: Read> {
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
}

impl<R: Read> CsvImportSource<R> {
    /// Creates a new CSV import source.
    ///
    /// An empty payload yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the header cannot be
    /// read or has no `name` column.
    pub fn new(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| parse_error(Format::Csv, e))?
            .clone();

        if !headers.is_empty() && !headers.iter().any(|h| h == CompanyField::Name.as_str()) {
            return Err(parse_error(
                Format::Csv,
                "header row has no 'name' column",
            ));
        }

        Ok(Self {
            reader: csv_reader,
            headers,
        })
    }

    fn to_fields(&self, record: &csv::StringRecord) -> FieldMap {
        self.headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (header.to_string(), value)
            })
            .collect()
    }
}

impl<R: Read> ImportSource for CsvImportSource<R> {
    fn next(&mut self) -> Result<Option<ImportRecord>> {
        let mut record = csv::StringRecord::new();

        let has_record = self
            .reader
            .read_record(&mut record)
            .map_err(|e| parse_error(Format::Csv, e))?;
        if !has_record {
            return Ok(None);
        }

        Ok(Some(ImportRecord::Fields(self.to_fields(&record))))
    }
}

/// CSV export sink.
///
/// Writes the header on creation of the first row, or on finalize for an
/// empty export, so the output always starts with the header.
pub struct CsvExportSink<W: Write> {
    writer: csv::Writer<W>,
    headers_written: bool,
}

impl<W: Write> CsvExportSink<W> {
    /// Creates a new CSV export sink.
    #[must_use]
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        Self {
            writer,
            headers_written: false,
        }
    }

    fn ensure_headers(&mut self) -> Result<()> {
        if !self.headers_written {
            self.writer
                .write_record(CompanyField::all().iter().map(CompanyField::as_str))
                .map_err(|e| write_error("write_csv_headers", e))?;
            self.headers_written = true;
        }
        Ok(())
    }
}

impl<W: Write> ExportSink for CsvExportSink<W> {
    fn write(&mut self, company: &Company) -> Result<()> {
        self.ensure_headers()?;

        self.writer
            .write_record(CompanyField::all().iter().map(|field| cell(company, *field)))
            .map_err(|e| write_error("write_csv", e))
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.ensure_headers()?;
        self.writer
            .flush()
            .map_err(|e| write_error("flush_csv", e))
    }
}

/// Renders one field as a CSV cell; `None` becomes an empty cell.
fn cell(company: &Company, field: CompanyField) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    match field {
        CompanyField::Id => company.id.to_string(),
        CompanyField::Name => company.name.clone(),
        CompanyField::Description => text(&company.description),
        CompanyField::LogoUrl => text(&company.logo_url),
        CompanyField::ParentId => company
            .parent_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        CompanyField::OrganizationId => text(&company.organization_id),
        CompanyField::Address => text(&company.address),
        CompanyField::Email => text(&company.email),
        CompanyField::PhoneNumber => text(&company.phone_number),
        CompanyField::Website => text(&company.website),
        CompanyField::CreatedAt => company
            .created_at
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        CompanyField::UpdatedAt => company
            .updated_at
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        CompanyField::IsActive => company.is_active.to_string(),
        CompanyField::RegistrationNumber => text(&company.registration_number),
        CompanyField::TaxId => text(&company.tax_id),
        CompanyField::Country => text(&company.country),
        CompanyField::City => text(&company.city),
        CompanyField::PostalCode => text(&company.postal_code),
        CompanyField::EmployeesCount => company
            .employees_count
            .map(|count| count.to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::models::{CompanyFields, CompanyId};
    use crate::storage::sqlite::company_from_fields;
    use std::io::Cursor;

    fn fields(record: Option<ImportRecord>) -> FieldMap {
        match record {
            Some(ImportRecord::Fields(map)) => map,
            other => panic!("expected fields, got {other:?}"),
        }
    }

    #[test]
    fn test_import_rows_with_nulls() {
        let input = "name,city,employees_count\nAcme, Oslo ,10\nBeta,,\n";
        let mut source = CsvImportSource::new(Cursor::new(input)).unwrap();

        let first = fields(source.next().unwrap());
        assert_eq!(first["name"], "Acme");
        assert_eq!(first["city"], "Oslo");
        assert_eq!(first["employees_count"], "10");

        let second = fields(source.next().unwrap());
        assert_eq!(second["city"], Value::Null);
        assert_eq!(second["employees_count"], Value::Null);

        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_missing_name_column_is_parse_error() {
        let result = CsvImportSource::new(Cursor::new("title,city\nAcme,Oslo\n"));
        assert!(matches!(result, Err(Error::Parse { format: "CSV", .. })));
    }

    #[test]
    fn test_ragged_record_is_parse_error() {
        let mut source = CsvImportSource::new(Cursor::new("name,city\nAcme,Oslo,extra\n")).unwrap();
        assert!(matches!(source.next(), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_empty_payload_yields_nothing() {
        let mut source = CsvImportSource::new(Cursor::new("")).unwrap();
        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_export_header_and_cells() {
        let now = crate::current_timestamp();
        let company = company_from_fields(
            CompanyId::new("c-1"),
            CompanyFields::new("Acme, Inc.")
                .with_email("hq@acme.test")
                .with_employees_count(7)
                .with_active(false),
            now,
            now,
        );

        let mut output = Vec::new();
        {
            let mut sink = CsvExportSink::new(&mut output);
            sink.write(&company).unwrap();
            Box::new(sink).finalize().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,description,logo_url,parent_id,organization_id,address,email,\
             phone_number,website,created_at,updated_at,is_active,registration_number,\
             tax_id,country,city,postal_code,employees_count"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("c-1,\"Acme, Inc.\",,,,,,hq@acme.test,"));
        assert!(row.contains(",false,"));
        assert!(row.ends_with(",7"));
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let mut output = Vec::new();
        Box::new(CsvExportSink::new(&mut output)).finalize().unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("id,name,"));
        assert_eq!(text.lines().count(), 1);
    }
}
