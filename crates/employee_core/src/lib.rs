//! Core logic for the employee records console.
//! This crate is the single source of truth for employee invariants.

pub mod config;
pub mod console;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, SettingsFile, SettingsOrigin};
pub use console::session::{MenuAction, Session, SessionError};
pub use console::{Console, ConsoleError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{Employee, EmployeeId, EmployeeValidationError, NewEmployee, Salary};
pub use repo::employee_repo::{EmployeeRepository, RepoError, RepoResult, SqliteEmployeeRepository};
pub use service::employee_service::{AboveAverageReport, EmployeeService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
