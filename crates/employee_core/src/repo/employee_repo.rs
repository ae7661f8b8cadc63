//! Employee repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, existence and aggregate queries over the `employees` table.
//! - Own the connection lifecycle: lazy open, reuse, reopen after a broken
//!   connection, single release.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Every value reaches SQL as a bound parameter.
//! - Email comparison is case-sensitive (SQLite `BINARY` collation).

use crate::db::{open_target, DbError, DbTarget};
use crate::model::employee::{
    Employee, EmployeeId, EmployeeValidationError, NewEmployee, Salary, DATE_FORMAT,
};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    date_of_birth,
    salary_cents
FROM employees";

const UNTAGGED_OPERATION: &str = "sqlite";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for employee persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EmployeeValidationError),
    /// Backend failure tagged with the store operation that hit it.
    Storage {
        operation: &'static str,
        source: DbError,
    },
    NotFound(EmployeeId),
    InvalidData(String),
}

impl RepoError {
    /// Whether the backend rejected the write on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Storage { source, .. } if source.is_constraint_violation())
    }

    /// Whether the connection that produced this error is unusable.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Storage { source, .. } if source.is_connection_failure())
    }

    fn within(self, operation: &'static str) -> Self {
        match self {
            Self::Storage { source, .. } => Self::Storage { operation, source },
            other => other,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage { operation, source } => {
                write!(f, "storage failure during `{operation}`: {source}")
            }
            Self::NotFound(id) => write!(f, "employee not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted employee data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage { source, .. } => Some(source),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<EmployeeValidationError> for RepoError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage {
            operation: UNTAGGED_OPERATION,
            source: value,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

/// Repository interface for employee records.
///
/// Methods take `&mut self`: one logical operation owns the store at a time.
pub trait EmployeeRepository {
    /// Inserts a new employee and returns the storage-assigned id.
    fn create(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId>;
    /// Returns every employee ordered by ascending id.
    fn get_all(&mut self) -> RepoResult<Vec<Employee>>;
    fn get_by_id(&mut self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    /// Replaces every mutable field of the row with `employee.id`.
    ///
    /// Returns `RepoError::NotFound` when no such row exists.
    fn update(&mut self, employee: &Employee) -> RepoResult<()>;
    /// Removes the row if present; absent ids are not an error.
    fn delete(&mut self, id: EmployeeId) -> RepoResult<()>;
    /// Counts employees whose salary is strictly above the population mean.
    fn count_above_average_salary(&mut self) -> RepoResult<u64>;
    fn exists(&mut self, id: EmployeeId) -> RepoResult<bool>;
    /// Whether any employee other than `exclude_id` uses `email`.
    fn email_exists(&mut self, email: &str, exclude_id: Option<EmployeeId>) -> RepoResult<bool>;

    /// Releases any held backend resources.
    fn close(&mut self) -> RepoResult<()> {
        Ok(())
    }
}

/// SQLite-backed employee repository holding one reusable connection.
#[derive(Debug)]
pub struct SqliteEmployeeRepository {
    target: DbTarget,
    conn: Option<Connection>,
}

impl SqliteEmployeeRepository {
    /// Creates a repository for `target`. No connection is opened yet.
    pub fn new(target: DbTarget) -> Self {
        Self { target, conn: None }
    }

    /// Parses `connection_string` and creates a repository for it.
    pub fn from_connection_string(connection_string: &str) -> RepoResult<Self> {
        let target = DbTarget::parse(connection_string).map_err(|source| RepoError::Storage {
            operation: "connect",
            source,
        })?;
        Ok(Self::new(target))
    }

    /// Wraps an already bootstrapped connection.
    ///
    /// Used by tests and callers that open the database themselves.
    pub fn with_connection(target: DbTarget, conn: Connection) -> Self {
        Self {
            target,
            conn: Some(conn),
        }
    }

    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&mut self) -> RepoResult<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                info!(
                    "event=store_connect module=repo status=start target={}",
                    self.target
                );
                open_target(&self.target)?
            }
        };
        Ok(self.conn.insert(conn))
    }

    fn run<T>(
        &mut self,
        operation: &'static str,
        statement: impl FnOnce(&mut Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = self
            .connection()
            .and_then(statement)
            .map_err(|err| err.within(operation));

        match &result {
            Ok(_) => debug!(
                "event=store_op module=repo op={operation} status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => {
                warn!(
                    "event=store_op module=repo op={operation} status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                if err.is_connection_failure() && self.conn.take().is_some() {
                    warn!(
                        "event=store_connect module=repo status=dropped op={operation} reason=connection_failure"
                    );
                }
            }
        }

        result
    }
}

impl EmployeeRepository for SqliteEmployeeRepository {
    fn create(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        employee.validate()?;

        self.run("create", |conn| {
            conn.execute(
                "INSERT INTO employees (
                    first_name,
                    last_name,
                    email,
                    date_of_birth,
                    salary_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    employee.first_name.as_str(),
                    employee.last_name.as_str(),
                    employee.email.as_str(),
                    date_to_db(employee.date_of_birth),
                    employee.salary.cents(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            info!("event=employee_create module=repo status=ok employee_id={id}");
            Ok(id)
        })
    }

    fn get_all(&mut self) -> RepoResult<Vec<Employee>> {
        self.run("get_all", |conn| {
            let mut stmt = conn.prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut employees = Vec::new();

            while let Some(row) = rows.next()? {
                employees.push(parse_employee_row(row)?);
            }

            Ok(employees)
        })
    }

    fn get_by_id(&mut self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.run("get_by_id", |conn| {
            let mut stmt = conn.prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_employee_row(row)?));
            }
            Ok(None)
        })
    }

    fn update(&mut self, employee: &Employee) -> RepoResult<()> {
        employee.validate()?;

        self.run("update", |conn| {
            let changed = conn.execute(
                "UPDATE employees
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    email = ?3,
                    date_of_birth = ?4,
                    salary_cents = ?5
                 WHERE id = ?6;",
                params![
                    employee.first_name.as_str(),
                    employee.last_name.as_str(),
                    employee.email.as_str(),
                    date_to_db(employee.date_of_birth),
                    employee.salary.cents(),
                    employee.id,
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::NotFound(employee.id));
            }

            info!(
                "event=employee_update module=repo status=ok employee_id={}",
                employee.id
            );
            Ok(())
        })
    }

    fn delete(&mut self, id: EmployeeId) -> RepoResult<()> {
        self.run("delete", |conn| {
            let removed = conn.execute("DELETE FROM employees WHERE id = ?1;", [id])?;
            info!("event=employee_delete module=repo status=ok employee_id={id} removed={removed}");
            Ok(())
        })
    }

    fn count_above_average_salary(&mut self) -> RepoResult<u64> {
        self.run("count_above_average_salary", |conn| {
            let tx = conn.transaction()?;
            let Some(threshold) = mean_floor_cents(&tx)? else {
                return Ok(0);
            };

            // Integer salaries: salary > sum / n  <=>  salary > floor(sum / n).
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM employees WHERE salary_cents > ?1;",
                [threshold],
                |row| row.get(0),
            )?;
            tx.commit()?;

            u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
        })
    }

    fn exists(&mut self, id: EmployeeId) -> RepoResult<bool> {
        self.run("exists", |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?1);",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn email_exists(&mut self, email: &str, exclude_id: Option<EmployeeId>) -> RepoResult<bool> {
        self.run("email_exists", |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM employees
                    WHERE email = ?1
                      AND (?2 IS NULL OR id <> ?2)
                );",
                params![email, exclude_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn close(&mut self) -> RepoResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=store_close module=repo status=ok target={}", self.target);
                Ok(())
            }
            Err((_conn, err)) => {
                // The handle is dropped here; rusqlite finalizes it on drop.
                warn!(
                    "event=store_close module=repo status=error target={} error={}",
                    self.target, err
                );
                Err(RepoError::from(err).within("close"))
            }
        }
    }
}

impl Drop for SqliteEmployeeRepository {
    fn drop(&mut self) {
        if self.conn.is_some() {
            let _ = self.close();
        }
    }
}

/// Looks up one employee, turning absence into `RepoError::NotFound`.
pub fn require_employee<R: EmployeeRepository + ?Sized>(
    repo: &mut R,
    id: EmployeeId,
) -> RepoResult<Employee> {
    repo.get_by_id(id)?.ok_or(RepoError::NotFound(id))
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let dob_text: String = row.get("date_of_birth")?;
    let date_of_birth = NaiveDate::parse_from_str(&dob_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{dob_text}` in employees.date_of_birth"
        ))
    })?;

    let salary_cents: i64 = row.get("salary_cents")?;
    let salary = Salary::from_cents(salary_cents).map_err(|_| {
        RepoError::InvalidData("negative value in employees.salary_cents".to_string())
    })?;

    let employee = Employee {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        date_of_birth,
        salary,
    };
    // Field names only: the message reaches the log.
    employee.validate().map_err(|err| {
        let field = match err {
            EmployeeValidationError::EmptyFirstName => "first_name",
            EmployeeValidationError::EmptyLastName => "last_name",
            EmployeeValidationError::InvalidEmail(_) => "email",
            EmployeeValidationError::NegativeSalary(_) => "salary_cents",
        };
        RepoError::InvalidData(format!("employee {} has an invalid {field}", employee.id))
    })?;
    Ok(employee)
}

/// `floor(SUM(salary_cents) / COUNT(*))`, or `None` for an empty table.
///
/// Summed in `i128` on this side: SQLite's integer `SUM` fails once the
/// total passes `i64::MAX`.
fn mean_floor_cents(conn: &Connection) -> RepoResult<Option<i64>> {
    let mut stmt = conn.prepare("SELECT salary_cents FROM employees;")?;
    let mut rows = stmt.query([])?;
    let mut total: i128 = 0;
    let mut population: i128 = 0;

    while let Some(row) = rows.next()? {
        let cents: i64 = row.get(0)?;
        if cents < 0 {
            return Err(RepoError::InvalidData(
                "negative value in employees.salary_cents".to_string(),
            ));
        }
        total += i128::from(cents);
        population += 1;
    }

    if population == 0 {
        return Ok(None);
    }
    // The floor of a mean never exceeds the largest summed value.
    let floor = i64::try_from(total / population)
        .map_err(|_| RepoError::InvalidData("salary mean out of range".to_string()))?;
    Ok(Some(floor))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
