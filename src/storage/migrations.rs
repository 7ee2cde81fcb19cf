//! Embedded `SQLite` schema migrations.
//!
//! Migrations are compiled in and applied in version order when the store
//! opens. Each one runs in its own transaction together with its row in the
//! `schema_migrations` tracking table.
//!
//! # Usage
//!
//! ```rust,ignore
//! use company_registry::storage::migrations::{COMPANY_MIGRATIONS, MigrationRunner};
//!
//! let applied = MigrationRunner::new(&conn).run(COMPANY_MIGRATIONS)?;
//! ```

use crate::storage::sqlite::{format_timestamp, sql_error, with_transaction};
use crate::{Result, current_timestamp};
use rusqlite::{Connection, OptionalExtension, params};

/// A single migration with version and SQL.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version (sequential, starting at 1).
    pub version: i32,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL to apply (may contain multiple statements).
    pub sql: &'static str,
}

/// Schema for the company store.
pub const COMPANY_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create companies table",
        sql: "CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                logo_url TEXT,
                parent_id TEXT REFERENCES companies(id) ON DELETE SET NULL,
                organization_id TEXT,
                address TEXT,
                email TEXT,
                phone_number TEXT,
                website TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                registration_number TEXT,
                tax_id TEXT,
                country TEXT,
                city TEXT,
                postal_code TEXT,
                employees_count INTEGER CHECK (employees_count IS NULL OR employees_count >= 0)
            );",
    },
    Migration {
        version: 2,
        description: "Index hierarchy, name lookups and listing order",
        sql: "CREATE INDEX IF NOT EXISTS idx_companies_parent_id ON companies(parent_id);
              CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);
              CREATE INDEX IF NOT EXISTS idx_companies_created_at ON companies(created_at);",
    },
    Migration {
        version: 3,
        description: "Enforce unique company names",
        sql: "DROP INDEX IF EXISTS idx_companies_name;
              CREATE UNIQUE INDEX IF NOT EXISTS idx_companies_name ON companies(name);",
    },
];

/// Applies pending migrations to a connection.
pub struct MigrationRunner<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationRunner<'a> {
    /// Creates a runner for the given connection.
    #[must_use]
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Runs all pending migrations and returns how many were applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails; earlier migrations stay applied.
    pub fn run(&self, migrations: &[Migration]) -> Result<usize> {
        self.ensure_migrations_table()?;
        let current = self.current_version()?;

        let mut applied = 0;
        for migration in migrations.iter().filter(|m| m.version > current) {
            self.apply(migration)?;
            applied += 1;
        }

        if applied > 0 {
            tracing::info!(applied, from_version = current, "Applied schema migrations");
        }
        Ok(applied)
    }

    /// Returns the highest applied version, or 0 for a fresh database.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking table cannot be queried.
    pub fn current_version(&self) -> Result<i32> {
        self.ensure_migrations_table()?;
        let version: Option<i32> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(sql_error("migration_current_version"))?
            .flatten();
        Ok(version.unwrap_or(0))
    }

    fn ensure_migrations_table(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    applied_at TEXT NOT NULL
                )",
            )
            .map_err(sql_error("migration_create_table"))
    }

    fn apply(&self, migration: &Migration) -> Result<()> {
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        with_transaction(self.conn, |conn| {
            conn.execute_batch(migration.sql)
                .map_err(sql_error("migration_apply"))?;
            conn.execute(
                "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
                params![
                    migration.version,
                    migration.description,
                    format_timestamp(&current_timestamp())
                ],
            )
            .map_err(sql_error("migration_record"))?;
            Ok(())
        })
    }
}
