//! Shared `SQLite` infrastructure for the company store.
//!
//! ## Module Structure
//!
//! - [`connection`]: [`Mutex<Connection>`](rusqlite::Connection) locking, pragmas, transactions
//! - [`company_row`]: row conversion for [`Company`](crate::models::Company) records
//! - [`metrics`]: storage operation metrics

mod company_row;
mod connection;
mod metrics;

pub use company_row::{
    COMPANY_COLUMNS, CompanyRow, build_company_from_row, company_from_fields, fetch_company,
    format_timestamp, parse_timestamp, query_companies,
};
pub use connection::{
    acquire_lock, configure_connection, sql_error, with_transaction, company_write_error,
};
pub use metrics::{record_operation_metrics, status_label};
