//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Parse configured connection strings into a [`DbTarget`].
//! - Open file or in-memory connections and configure pragmas.
//! - Bootstrap the schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a 5s busy timeout.
//! - Returned connections have the employee schema applied.

use super::schema::apply_schema;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MEMORY_TARGET: &str = ":memory:";
const SQLITE_SCHEME: &str = "sqlite://";

/// Where the employee database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    Memory,
}

impl DbTarget {
    /// Parses a connection string.
    ///
    /// Accepted forms: a file path, the same path prefixed with `sqlite://`,
    /// or `:memory:`. Surrounding whitespace is ignored.
    pub fn parse(connection_string: &str) -> DbResult<Self> {
        let trimmed = connection_string.trim();
        let location = trimmed.strip_prefix(SQLITE_SCHEME).unwrap_or(trimmed);

        if location.is_empty() {
            return Err(DbError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }
        if location == MEMORY_TARGET {
            return Ok(Self::Memory);
        }
        if location.contains('\0') {
            return Err(DbError::InvalidConnectionString(
                "connection string contains a NUL byte".to_string(),
            ));
        }

        Ok(Self::File(PathBuf::from(location)))
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for DbTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(MEMORY_TARGET),
        }
    }
}

/// Opens the database described by `target` and bootstraps its schema.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_target(target: &DbTarget) -> DbResult<Connection> {
    match target {
        DbTarget::File(path) => open_db(path),
        DbTarget::Memory => open_db_in_memory(),
    }
}

/// Opens a SQLite database file and bootstraps the schema.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let target = DbTarget::File(path.as_ref().to_path_buf());
    open_logged(&target, || Connection::open(path.as_ref()))
}

/// Opens an in-memory SQLite database and bootstraps the schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged(&DbTarget::Memory, Connection::open_in_memory)
}

fn open_logged(
    target: &DbTarget,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_schema(conn)?;
    Ok(())
}
