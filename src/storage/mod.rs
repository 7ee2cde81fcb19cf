//! Storage layer.
//!
//! - **Traits**: the [`CompanyStore`] contract services depend on
//! - **Persistence**: the `SQLite` implementation ([`SqliteCompanyStore`])
//! - **Migrations**: embedded schema versions applied on open
//! - **`SQLite` helpers**: locking, transactions, row conversion, metrics

// Dropping the connection guard slightly earlier brings no measurable benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod migrations;
pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use persistence::SqliteCompanyStore;
pub use traits::CompanyStore;
