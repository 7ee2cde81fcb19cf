//! Row conversion for the `companies` table.

use super::connection::sql_error;
use crate::models::{Company, CompanyFields, CompanyId};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Column list in table order, shared by every `SELECT`.
pub const COMPANY_COLUMNS: &str = "id, name, description, logo_url, parent_id, organization_id, \
     address, email, phone_number, website, created_at, updated_at, is_active, \
     registration_number, tax_id, country, city, postal_code, employees_count";

/// A `companies` row with primitive column types.
///
/// Use [`build_company_from_row`] to convert it into a [`Company`].
#[derive(Debug)]
pub struct CompanyRow {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Parent company id.
    pub parent_id: Option<String>,
    /// External organization reference.
    pub organization_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Website.
    pub website: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 update time.
    pub updated_at: String,
    /// Active flag.
    pub is_active: bool,
    /// Registration number.
    pub registration_number: Option<String>,
    /// Tax identifier.
    pub tax_id: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Employee count.
    pub employees_count: Option<u32>,
}

impl CompanyRow {
    /// Reads a row selected with [`COMPANY_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            logo_url: row.get(3)?,
            parent_id: row.get(4)?,
            organization_id: row.get(5)?,
            address: row.get(6)?,
            email: row.get(7)?,
            phone_number: row.get(8)?,
            website: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            is_active: row.get(12)?,
            registration_number: row.get(13)?,
            tax_id: row.get(14)?,
            country: row.get(15)?,
            city: row.get(16)?,
            postal_code: row.get(17)?,
            employees_count: row.get(18)?,
        })
    }
}

/// Converts a database row into a [`Company`].
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a stored timestamp is not valid RFC 3339.
pub fn build_company_from_row(row: CompanyRow) -> Result<Company> {
    Ok(Company {
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        id: CompanyId::new(row.id),
        name: row.name,
        description: row.description,
        logo_url: row.logo_url,
        parent_id: row.parent_id.map(CompanyId::new),
        organization_id: row.organization_id,
        address: row.address,
        email: row.email,
        phone_number: row.phone_number,
        website: row.website,
        is_active: row.is_active,
        registration_number: row.registration_number,
        tax_id: row.tax_id,
        country: row.country,
        city: row.city,
        postal_code: row.postal_code,
        employees_count: row.employees_count,
    })
}

/// Assembles a [`Company`] from written fields without re-reading the row.
#[must_use]
pub fn company_from_fields(
    id: CompanyId,
    fields: CompanyFields,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Company {
    Company {
        id,
        name: fields.name,
        description: fields.description,
        logo_url: fields.logo_url,
        parent_id: fields.parent_id,
        organization_id: fields.organization_id,
        address: fields.address,
        email: fields.email,
        phone_number: fields.phone_number,
        website: fields.website,
        created_at,
        updated_at,
        is_active: fields.is_active,
        registration_number: fields.registration_number,
        tax_id: fields.tax_id,
        country: fields.country,
        city: fields.city,
        postal_code: fields.postal_code,
        employees_count: fields.employees_count,
    }
}

/// Fetches a single company by id.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the query fails or the row is corrupt.
pub fn fetch_company(conn: &Connection, id: &CompanyId) -> Result<Option<Company>> {
    let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1");
    conn.query_row(&sql, params![id.as_str()], CompanyRow::from_row)
        .optional()
        .map_err(sql_error("get_company"))?
        .map(build_company_from_row)
        .transpose()
}

/// Runs a `SELECT` over [`COMPANY_COLUMNS`] and collects the companies.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the query fails or a row is corrupt.
pub fn query_companies(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    operation: &'static str,
) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare(sql).map_err(sql_error(operation))?;
    let rows = stmt
        .query_map(params, CompanyRow::from_row)
        .map_err(sql_error(operation))?;

    let mut companies = Vec::new();
    for row in rows {
        let row = row.map_err(sql_error(operation))?;
        companies.push(build_company_from_row(row)?);
    }
    Ok(companies)
}

/// Formats a timestamp for storage (RFC 3339, microseconds, `Z`).
///
/// The fixed width keeps lexical and chronological order identical.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the value is not valid RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::OperationFailed {
            operation: "parse_timestamp".to_string(),
            cause: format!("{value}: {e}"),
        })
}
