//! Employee table bootstrap.
//!
//! # Responsibility
//! - Create the `employees` table and its email index on a fresh database.
//! - Refuse databases written by a newer binary.
//!
//! # Invariants
//! - A bootstrapped database reports [`SCHEMA_VERSION`] in `PRAGMA user_version`.
//! - Table creation and version stamping commit together.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Layout version this binary reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

const EMPLOYEES_SQL: &str = include_str!("employees.sql");

/// Creates the employee table when missing and stamps the version.
///
/// Tables left by an unversioned database are kept (`IF NOT EXISTS`).
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if found > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(EMPLOYEES_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}
