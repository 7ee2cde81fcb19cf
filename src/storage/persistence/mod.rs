//! Company store implementations.

mod sqlite;

pub use sqlite::SqliteCompanyStore;
