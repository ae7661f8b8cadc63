//! Employee use-case service.
//!
//! # Responsibility
//! - Provide storage-agnostic entry points for console and CLI callers.
//! - Build the above-average salary report.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - The report's client-side selection uses the same strict, exact
//!   comparison as the store's aggregate query.

use crate::model::employee::{Employee, EmployeeId, NewEmployee, Salary};
use crate::repo::employee_repo::{require_employee, EmployeeRepository, RepoResult};
use log::{info, warn};

/// Result of the above-average salary query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboveAverageReport {
    /// Number of employees the mean was computed over.
    pub population: usize,
    /// Mean salary rounded half-up to whole cents; `None` for an empty table.
    pub mean_salary: Option<Salary>,
    /// Employees strictly above the mean, ordered by id.
    pub above_average: Vec<Employee>,
    /// Count computed by the store.
    pub store_count: u64,
}

impl AboveAverageReport {
    /// Builds the client-side half of the report from a full population.
    pub fn from_population(employees: Vec<Employee>, store_count: u64) -> Self {
        let population = employees.len();
        let total: i128 = employees
            .iter()
            .map(|employee| i128::from(employee.salary.cents()))
            .sum();
        let count = population as i128;

        let mean_salary = if population == 0 {
            None
        } else {
            let rounded = (total * 2 + count) / (count * 2);
            i64::try_from(rounded)
                .ok()
                .and_then(|cents| Salary::from_cents(cents).ok())
        };

        let above_average = employees
            .into_iter()
            .filter(|employee| i128::from(employee.salary.cents()) * count > total)
            .collect();

        Self {
            population,
            mean_salary,
            above_average,
            store_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.population == 0
    }

    /// Whether the store count matches the client-side selection.
    pub fn counts_agree(&self) -> bool {
        u64::try_from(self.above_average.len()).is_ok_and(|count| count == self.store_count)
    }
}

/// Use-case service wrapper for employee operations.
pub struct EmployeeService<R: EmployeeRepository> {
    repo: R,
}

impl<R: EmployeeRepository> EmployeeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_employee(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        self.repo.create(employee)
    }

    pub fn list_employees(&mut self) -> RepoResult<Vec<Employee>> {
        self.repo.get_all()
    }

    pub fn get_employee(&mut self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.repo.get_by_id(id)
    }

    /// Gets one employee or fails with `RepoError::NotFound`.
    pub fn require_employee(&mut self, id: EmployeeId) -> RepoResult<Employee> {
        require_employee(&mut self.repo, id)
    }

    /// Replaces the stored record with `employee`.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_employee(&mut self, employee: &Employee) -> RepoResult<()> {
        self.repo.update(employee)
    }

    pub fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    pub fn email_in_use(&mut self, email: &str, exclude_id: Option<EmployeeId>) -> RepoResult<bool> {
        self.repo.email_exists(email, exclude_id)
    }

    /// Builds the above-average report from one population snapshot.
    pub fn above_average_report(&mut self) -> RepoResult<AboveAverageReport> {
        let store_count = self.repo.count_above_average_salary()?;
        let employees = self.repo.get_all()?;
        let report = AboveAverageReport::from_population(employees, store_count);

        if report.counts_agree() {
            info!(
                "event=salary_report module=service status=ok population={} above_average={}",
                report.population, report.store_count
            );
        } else {
            warn!(
                "event=salary_report module=service status=mismatch population={} store_count={} client_count={}",
                report.population,
                report.store_count,
                report.above_average.len()
            );
        }

        Ok(report)
    }

    /// Releases the repository's backend resources.
    pub fn close(&mut self) -> RepoResult<()> {
        self.repo.close()
    }

    pub fn into_repository(self) -> R {
        self.repo
    }
}
