#![allow(dead_code)]

use chrono::NaiveDate;
use employee_core::db::{open_db_in_memory, DbError, DbTarget};
use employee_core::{
    Console, Employee, EmployeeId, EmployeeRepository, EmployeeService, NewEmployee, RepoError,
    RepoResult, Salary, Session, SettingsFile, SqliteEmployeeRepository,
};
use std::io::Cursor;
use tempfile::TempDir;

pub type TestSession<R> = Session<R, Cursor<Vec<u8>>, Vec<u8>>;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fixed_today() -> NaiveDate {
    date(2026, 10, 17)
}

pub fn new_employee(first: &str, last: &str, email: &str, salary_units: u32) -> NewEmployee {
    NewEmployee {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        date_of_birth: date(1990, 5, 17),
        salary: Salary::from_units(salary_units),
    }
}

pub fn memory_repo() -> SqliteEmployeeRepository {
    let conn = open_db_in_memory().unwrap();
    SqliteEmployeeRepository::with_connection(DbTarget::Memory, conn)
}

/// Session over `repo` fed with `input`, plus the temp dir holding settings.
pub fn session_with<R: EmployeeRepository>(repo: R, input: &str) -> (TestSession<R>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsFile::create_default(dir.path().join("settings.toml")).unwrap();
    let console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let session =
        Session::new(EmployeeService::new(repo), settings, console).with_clock(fixed_today);
    (session, dir)
}

pub fn output_of<R: EmployeeRepository>(session: &TestSession<R>) -> String {
    String::from_utf8(session.console().output().clone()).unwrap()
}

/// In-memory repository that records which operations were called.
#[derive(Default)]
pub struct RecordingRepository {
    pub employees: Vec<Employee>,
    pub calls: Vec<&'static str>,
    pub fail_reads: bool,
    next_id: EmployeeId,
}

impl RecordingRepository {
    pub fn with_employees(employees: Vec<NewEmployee>) -> Self {
        let mut repo = Self::default();
        for employee in employees {
            repo.create(&employee).unwrap();
        }
        repo.calls.clear();
        repo
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls.iter().any(|call| *call == operation)
    }

    fn offline(operation: &'static str) -> RepoError {
        RepoError::Storage {
            operation,
            source: DbError::InvalidConnectionString("database offline".to_string()),
        }
    }
}

impl EmployeeRepository for RecordingRepository {
    fn create(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        self.calls.push("create");
        employee.validate()?;
        self.next_id += 1;
        self.employees.push(employee.clone().with_id(self.next_id));
        Ok(self.next_id)
    }

    fn get_all(&mut self) -> RepoResult<Vec<Employee>> {
        self.calls.push("get_all");
        if self.fail_reads {
            return Err(Self::offline("get_all"));
        }
        Ok(self.employees.clone())
    }

    fn get_by_id(&mut self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.calls.push("get_by_id");
        Ok(self.employees.iter().find(|e| e.id == id).cloned())
    }

    fn update(&mut self, employee: &Employee) -> RepoResult<()> {
        self.calls.push("update");
        match self.employees.iter_mut().find(|e| e.id == employee.id) {
            Some(slot) => {
                *slot = employee.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(employee.id)),
        }
    }

    fn delete(&mut self, id: EmployeeId) -> RepoResult<()> {
        self.calls.push("delete");
        self.employees.retain(|e| e.id != id);
        Ok(())
    }

    fn count_above_average_salary(&mut self) -> RepoResult<u64> {
        self.calls.push("count_above_average_salary");
        let n = self.employees.len() as i128;
        let total: i128 = self
            .employees
            .iter()
            .map(|e| i128::from(e.salary.cents()))
            .sum();
        Ok(self
            .employees
            .iter()
            .filter(|e| i128::from(e.salary.cents()) * n > total)
            .count() as u64)
    }

    fn exists(&mut self, id: EmployeeId) -> RepoResult<bool> {
        self.calls.push("exists");
        Ok(self.employees.iter().any(|e| e.id == id))
    }

    fn email_exists(&mut self, email: &str, exclude_id: Option<EmployeeId>) -> RepoResult<bool> {
        self.calls.push("email_exists");
        Ok(self
            .employees
            .iter()
            .any(|e| e.email == email && Some(e.id) != exclude_id))
    }
}
