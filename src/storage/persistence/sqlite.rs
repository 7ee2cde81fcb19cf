//! `SQLite`-based company store.
//!
//! Provides durable storage using `SQLite` as the authoritative source of truth
//! for company records and their parent/child links.

use crate::config::DatabaseLocation;
use crate::models::{Company, CompanyDraft, CompanyFields, CompanyId};
use crate::storage::migrations::{COMPANY_MIGRATIONS, MigrationRunner};
use crate::storage::sqlite::{
    COMPANY_COLUMNS, acquire_lock, company_from_fields, configure_connection, fetch_company,
    format_timestamp, parse_timestamp, query_companies, record_operation_metrics, sql_error,
    status_label, with_transaction, company_write_error,
};
use crate::storage::traits::CompanyStore;
use crate::{Error, Result, current_timestamp};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

const BACKEND: &str = "sqlite";

/// `SQLite`-based company store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access; each operation holds
/// the lock for its own statement or transaction only. WAL mode and
/// `busy_timeout` handle contention from other processes on file databases.
///
/// # Timestamps
///
/// `updated_at` strictly increases on every mutation. When the clock has not
/// moved past the previous value (same microsecond, or a clock step back) the
/// new value is the previous one plus one microsecond.
pub struct SqliteCompanyStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
}

impl SqliteCompanyStore {
    /// Opens (creating if needed) a file-backed store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_db_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }
        let conn = Connection::open(&db_path).map_err(sql_error("open_sqlite"))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error("open_sqlite_in_memory"))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Opens the store described by a configured database location.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(location: &DatabaseLocation) -> Result<Self> {
        match location {
            DatabaseLocation::Memory => Self::in_memory(),
            DatabaseLocation::File(path) => Self::new(path.clone()),
        }
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        MigrationRunner::new(&conn).run(COMPANY_MIGRATIONS)?;
        Ok(())
    }

    /// Runs `f` under the connection lock and records metrics for it.
    fn observe<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = {
            let conn = acquire_lock(&self.conn);
            f(&*conn)
        };
        record_operation_metrics(BACKEND, operation, start, status_label(&result));
        result
    }
}

/// Returns a timestamp strictly after `previous`.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = current_timestamp();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Reads `(created_at, updated_at)` for a row, if it exists.
fn fetch_timestamps(
    conn: &Connection,
    id: &CompanyId,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT created_at, updated_at FROM companies WHERE id = ?1",
            params![id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(sql_error("get_company_timestamps"))?;

    row.map(|(created, updated)| Ok((parse_timestamp(&created)?, parse_timestamp(&updated)?)))
        .transpose()
}

/// Writes every mutable column of an existing row.
fn update_fields(
    conn: &Connection,
    id: &CompanyId,
    fields: &CompanyFields,
    updated_at: &DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE companies SET
            name = ?2, description = ?3, logo_url = ?4, parent_id = ?5, organization_id = ?6,
            address = ?7, email = ?8, phone_number = ?9, website = ?10, updated_at = ?11,
            is_active = ?12, registration_number = ?13, tax_id = ?14, country = ?15,
            city = ?16, postal_code = ?17, employees_count = ?18
         WHERE id = ?1",
        params![
            id.as_str(),
            fields.name,
            fields.description,
            fields.logo_url,
            fields.parent_id.as_ref().map(CompanyId::as_str),
            fields.organization_id,
            fields.address,
            fields.email,
            fields.phone_number,
            fields.website,
            format_timestamp(updated_at),
            fields.is_active,
            fields.registration_number,
            fields.tax_id,
            fields.country,
            fields.city,
            fields.postal_code,
            fields.employees_count,
        ],
    )
    .map_err(company_write_error("update_company"))?;
    Ok(())
}

impl CompanyStore for SqliteCompanyStore {
    #[instrument(skip(self), fields(operation = "get", backend = BACKEND, company.id = %id))]
    fn get(&self, id: &CompanyId) -> Result<Option<Company>> {
        self.observe("get", |conn| fetch_company(conn, id))
    }

    #[instrument(skip(self), fields(operation = "list", backend = BACKEND))]
    fn list(&self) -> Result<Vec<Company>> {
        self.observe("list", |conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY created_at ASC, rowid ASC"
            );
            query_companies(conn, &sql, [], "list_companies")
        })
    }

    #[instrument(skip(self), fields(operation = "list_parents_first", backend = BACKEND))]
    fn list_parents_first(&self) -> Result<Vec<Company>> {
        self.observe("list_parents_first", |conn| {
            let sql = format!(
                "WITH RECURSIVE tree(node_id, depth) AS (
                     SELECT id, 0 FROM companies WHERE parent_id IS NULL
                     UNION ALL
                     SELECT companies.id, tree.depth + 1
                     FROM companies JOIN tree ON companies.parent_id = tree.node_id
                 )
                 SELECT {COMPANY_COLUMNS} FROM companies
                 JOIN tree ON tree.node_id = companies.id
                 ORDER BY tree.depth ASC, created_at ASC, companies.rowid ASC"
            );
            query_companies(conn, &sql, [], "list_companies_parents_first")
        })
    }

    #[instrument(skip(self, fields), fields(operation = "create", backend = BACKEND, company.id = %id))]
    fn create_with_id(&self, id: CompanyId, fields: CompanyFields) -> Result<Company> {
        self.observe("create", |conn| {
            let now = current_timestamp();
            let stamp = format_timestamp(&now);
            conn.execute(
                &format!(
                    "INSERT INTO companies ({COMPANY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
                ),
                params![
                    id.as_str(),
                    fields.name,
                    fields.description,
                    fields.logo_url,
                    fields.parent_id.as_ref().map(CompanyId::as_str),
                    fields.organization_id,
                    fields.address,
                    fields.email,
                    fields.phone_number,
                    fields.website,
                    stamp,
                    stamp,
                    fields.is_active,
                    fields.registration_number,
                    fields.tax_id,
                    fields.country,
                    fields.city,
                    fields.postal_code,
                    fields.employees_count,
                ],
            )
            .map_err(company_write_error("insert_company"))?;

            Ok(company_from_fields(id, fields, now, now))
        })
    }

    #[instrument(skip(self, fields), fields(operation = "replace", backend = BACKEND, company.id = %id))]
    fn replace(&self, id: &CompanyId, fields: CompanyFields) -> Result<Option<Company>> {
        self.observe("replace", |conn| {
            with_transaction(conn, |conn| {
                let Some((created_at, previous)) = fetch_timestamps(conn, id)? else {
                    return Ok(None);
                };
                let updated_at = next_timestamp(previous);
                update_fields(conn, id, &fields, &updated_at)?;
                Ok(Some(company_from_fields(
                    id.clone(),
                    fields,
                    created_at,
                    updated_at,
                )))
            })
        })
    }

    #[instrument(skip(self, draft), fields(operation = "patch", backend = BACKEND, company.id = %id))]
    fn patch(&self, id: &CompanyId, draft: CompanyDraft) -> Result<Option<Company>> {
        self.observe("patch", |conn| {
            with_transaction(conn, |conn| {
                let Some(existing) = fetch_company(conn, id)? else {
                    return Ok(None);
                };
                let mut fields = existing.fields();
                draft.apply_to(&mut fields);

                let updated_at = next_timestamp(existing.updated_at);
                update_fields(conn, id, &fields, &updated_at)?;
                Ok(Some(company_from_fields(
                    id.clone(),
                    fields,
                    existing.created_at,
                    updated_at,
                )))
            })
        })
    }

    #[instrument(skip(self), fields(operation = "delete", backend = BACKEND, company.id = %id))]
    fn delete(&self, id: &CompanyId) -> Result<Option<usize>> {
        self.observe("delete", |conn| {
            with_transaction(conn, |conn| {
                if fetch_timestamps(conn, id)?.is_none() {
                    return Ok(None);
                }

                let children: Vec<(String, String)> = {
                    let mut stmt = conn
                        .prepare("SELECT id, updated_at FROM companies WHERE parent_id = ?1")
                        .map_err(sql_error("prepare_orphan_children"))?;
                    let rows = stmt
                        .query_map(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
                        .map_err(sql_error("orphan_children"))?;
                    rows.collect::<rusqlite::Result<_>>()
                        .map_err(sql_error("orphan_children"))?
                };

                for (child_id, previous) in &children {
                    let updated_at = next_timestamp(parse_timestamp(previous)?);
                    conn.execute(
                        "UPDATE companies SET parent_id = NULL, updated_at = ?2 WHERE id = ?1",
                        params![child_id, format_timestamp(&updated_at)],
                    )
                    .map_err(sql_error("orphan_child"))?;
                }

                conn.execute("DELETE FROM companies WHERE id = ?1", params![id.as_str()])
                    .map_err(sql_error("delete_company"))?;

                Ok(Some(children.len()))
            })
        })
    }

    #[instrument(skip(self), fields(operation = "find_by_name", backend = BACKEND))]
    fn find_by_name(&self, name: &str) -> Result<Option<Company>> {
        self.observe("find_by_name", |conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS} FROM companies WHERE name = ?1 ORDER BY rowid LIMIT 1"
            );
            Ok(query_companies(conn, &sql, params![name], "find_company_by_name")?
                .into_iter()
                .next())
        })
    }

    #[instrument(skip(self), fields(operation = "children", backend = BACKEND, company.id = %id))]
    fn children(&self, id: &CompanyId) -> Result<Vec<Company>> {
        self.observe("children", |conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS} FROM companies WHERE parent_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            );
            query_companies(conn, &sql, params![id.as_str()], "list_children")
        })
    }

    #[instrument(skip(self), fields(operation = "count", backend = BACKEND))]
    fn count(&self) -> Result<usize> {
        self.observe("count", |conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
                .map_err(sql_error("count_companies"))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> SqliteCompanyStore {
        SqliteCompanyStore::in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let created = store
            .create(CompanyFields::new("Acme").with_email("hq@acme.test"))
            .unwrap();

        assert_eq!(created.created_at, created.updated_at);
        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get(&CompanyId::new("missing")).unwrap().is_none());
    }

    #[test]
    fn test_list_in_creation_order() {
        let store = store();
        for name in ["First", "Second", "Third"] {
            store.create(CompanyFields::new(name)).unwrap();
        }
        let names: Vec<String> = store.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_list_parents_first_orders_by_depth() {
        let store = store();
        let child = store.create(CompanyFields::new("Child")).unwrap();
        let grandchild = store
            .create(CompanyFields::new("Grandchild").with_parent(child.id.clone()))
            .unwrap();
        let parent = store.create(CompanyFields::new("Parent")).unwrap();
        store
            .replace(&child.id, CompanyFields::new("Child").with_parent(parent.id.clone()))
            .unwrap();
        store.create(CompanyFields::new("Loner")).unwrap();

        let names: Vec<String> = store
            .list_parents_first()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Parent", "Loner", "Child", "Grandchild"]);
        assert_eq!(store.list().unwrap()[0].id, child.id);
        assert_eq!(store.list().unwrap()[1].id, grandchild.id);
    }

    #[test]
    fn test_replace_overwrites_and_advances_updated_at() {
        let store = store();
        let created = store
            .create(CompanyFields::new("Acme").with_employees_count(10))
            .unwrap();

        let replaced = store
            .replace(&created.id, CompanyFields::new("Acme Corp"))
            .unwrap()
            .unwrap();

        assert_eq!(replaced.name, "Acme Corp");
        assert!(replaced.employees_count.is_none());
        assert_eq!(replaced.created_at, created.created_at);
        assert!(replaced.updated_at > created.updated_at);
        assert_eq!(store.get(&created.id).unwrap().unwrap(), replaced);
    }

    #[test]
    fn test_replace_missing_returns_none() {
        let store = store();
        let result = store
            .replace(&CompanyId::new("missing"), CompanyFields::new("X"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_patch_applies_supplied_fields_only() {
        let store = store();
        let created = store
            .create(CompanyFields::new("Acme").with_email("hq@acme.test"))
            .unwrap();

        let patched = store
            .patch(
                &created.id,
                CompanyDraft {
                    city: Some(Some("Lisbon".to_string())),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(patched.name, "Acme");
        assert_eq!(patched.email.as_deref(), Some("hq@acme.test"));
        assert_eq!(patched.city.as_deref(), Some("Lisbon"));
        assert!(patched.updated_at > created.updated_at);
    }

    #[test]
    fn test_rapid_mutations_keep_updated_at_increasing() {
        let store = store();
        let created = store.create(CompanyFields::new("Acme")).unwrap();

        let mut previous = created.updated_at;
        for i in 0..20 {
            let patched = store
                .patch(
                    &created.id,
                    CompanyDraft {
                        employees_count: Some(Some(i)),
                        ..Default::default()
                    },
                )
                .unwrap()
                .unwrap();
            assert!(patched.updated_at > previous);
            previous = patched.updated_at;
        }
    }

    #[test]
    fn test_delete_orphans_children() {
        let store = store();
        let parent = store.create(CompanyFields::new("Parent")).unwrap();
        let child = store
            .create(CompanyFields::new("Child").with_parent(parent.id.clone()))
            .unwrap();

        assert_eq!(store.children(&parent.id).unwrap().len(), 1);
        assert_eq!(store.delete(&parent.id).unwrap(), Some(1));

        assert!(store.get(&parent.id).unwrap().is_none());
        let orphan = store.get(&child.id).unwrap().unwrap();
        assert!(orphan.parent_id.is_none());
        assert!(orphan.updated_at > child.updated_at);
        assert_eq!(store.delete(&parent.id).unwrap(), None);
    }

    #[test]
    fn test_foreign_key_rejects_dangling_parent() {
        let store = store();
        let result =
            store.create(CompanyFields::new("Orphan").with_parent(CompanyId::new("nope")));
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_duplicate_name_rejected_by_store() {
        let store = store();
        let first = store.create(CompanyFields::new("Dup")).unwrap();
        let other = store.create(CompanyFields::new("Other")).unwrap();

        let result = store.create(CompanyFields::new("Dup"));
        assert!(
            matches!(&result, Err(Error::Validation(errors)) if errors.contains("name")),
            "{result:?}"
        );
        let result = store.replace(&other.id, CompanyFields::new("Dup"));
        assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.find_by_name("Dup").unwrap().map(|c| c.id), Some(first.id));
    }

    #[test]
    fn test_find_by_name() {
        let store = store();
        let created = store.create(CompanyFields::new("Initech")).unwrap();
        assert_eq!(
            store.find_by_name("Initech").unwrap().map(|c| c.id),
            Some(created.id)
        );
        assert!(store.find_by_name("initech").unwrap().is_none());
    }

    #[test]
    fn test_create_with_id_preserves_id() {
        let store = store();
        let id = CompanyId::new("fixed-id");
        let created = store
            .create_with_id(id.clone(), CompanyFields::new("Fixed"))
            .unwrap();
        assert_eq!(created.id, id);
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("registry.db");

        let id = {
            let store = SqliteCompanyStore::new(&path).unwrap();
            store.create(CompanyFields::new("Durable")).unwrap().id
        };

        let reopened = SqliteCompanyStore::new(&path).unwrap();
        assert!(path.exists());
        assert_eq!(reopened.get(&id).unwrap().unwrap().name, "Durable");
    }

    #[test]
    fn test_next_timestamp_is_strictly_later() {
        let future = current_timestamp() + Duration::seconds(60);
        assert_eq!(next_timestamp(future), future + Duration::microseconds(1));

        let past = current_timestamp() - Duration::seconds(60);
        assert!(next_timestamp(past) > past);
    }
}
