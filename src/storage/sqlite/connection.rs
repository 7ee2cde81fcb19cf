//! Connection handling for the `SQLite` company store.
//!
//! Mutex access with poison recovery, connection pragmas and a transaction
//! wrapper shared by every store operation.

use crate::validation::{NAME_NOT_UNIQUE, ValidationErrors};
use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (a previous critical section panicked) the inner
/// value is recovered and a warning is logged, so one failed request does not
/// take the store down for every request after it.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for the store.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: durability/performance balance
/// - **`busy_timeout`**: wait up to 5 seconds on lock contention
/// - **`foreign_keys`**: enforce `parent_id` references
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if foreign key enforcement cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal" / "memory"), so the result is ignored
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(sql_error("enable_foreign_keys"))?;

    Ok(())
}

/// Runs `f` inside an immediate transaction.
///
/// Commits when `f` succeeds, rolls back otherwise.
///
/// # Errors
///
/// Returns the error from `f`, or [`Error::OperationFailed`] if the
/// transaction cannot be started or committed.
pub fn with_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(sql_error("begin_transaction"))?;

    let result = f(conn);

    if result.is_ok() {
        if let Err(e) = conn.execute_batch("COMMIT") {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(sql_error("commit_transaction")(e));
        }
    } else {
        let _ = conn.execute_batch("ROLLBACK");
    }

    result
}

/// Maps a `rusqlite` error to [`Error::OperationFailed`] for `operation`.
pub fn sql_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Maps a failed company write.
///
/// A collision on the unique name index becomes a `name` validation error;
/// everything else goes through [`sql_error`].
pub fn company_write_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| {
        if is_duplicate_name(&e) {
            Error::Validation(ValidationErrors::single("name", NAME_NOT_UNIQUE))
        } else {
            sql_error(operation)(e)
        }
    }
}

fn is_duplicate_name(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, Some(message))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains("companies.name")
    )
}
