//! Startup checks and connection string remediation.
//!
//! # Responsibility
//! - Verify the store answers before the menu starts.
//! - Explain startup failures and offer to fix the connection string.
//!
//! # Invariants
//! - Remediation is offered at most once per failure.
//! - A blank connection string is never written to the settings file.

use super::{Console, ConsoleResult};
use crate::config::{SettingsFile, DEFAULT_CONNECTION_STRING};
use crate::repo::employee_repo::{EmployeeRepository, RepoError};
use crate::service::employee_service::EmployeeService;
use log::{error, info, warn};
use std::io::{BufRead, Write};
use std::path::Path;

const CONNECTION_STRING_EXAMPLES: &[&str] = &[
    DEFAULT_CONNECTION_STRING,
    "/var/lib/employee-db/employees.sqlite3",
    "sqlite://C:/data/employees.sqlite3",
    ":memory: (temporary, data is lost on exit)",
];

/// Checks that the store answers by listing every employee.
///
/// Returns the number of employees found.
pub fn verify_store<R, I, O>(
    service: &mut EmployeeService<R>,
    console: &mut Console<I, O>,
) -> ConsoleResult<Result<usize, RepoError>>
where
    R: EmployeeRepository,
    I: BufRead,
    O: Write,
{
    match service.list_employees() {
        Ok(employees) => {
            info!(
                "event=startup_verify module=console status=ok employees={}",
                employees.len()
            );
            console.say("Connected to the employee database.")?;
            console.say(format!("Employees found: {}.", employees.len()))?;
            Ok(Ok(employees.len()))
        }
        Err(err) => {
            error!("event=startup_verify module=console status=error error={err}");
            Ok(Err(err))
        }
    }
}

/// Prints diagnostic guidance for a store that failed verification.
pub fn report_storage_failure<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    settings: &SettingsFile,
    err: &RepoError,
) -> ConsoleResult<()> {
    console.say(format!("Connection error: {err}"))?;
    console.blank_line()?;
    console.say("Check:")?;
    console.say(format!(
        "1. The connection string `{}` points at a writable location",
        settings.connection_string()
    ))?;
    console.say("2. The file is an employee database (or does not exist yet)")?;
    console.say(format!(
        "3. The settings file {} is valid",
        settings.path().display()
    ))
}

/// Asks once whether to change the connection string, then prompts for it.
///
/// Returns whether a new value was saved.
pub fn offer_connection_string_update<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    settings: &mut SettingsFile,
) -> ConsoleResult<bool> {
    console.blank_line()?;
    if !console.confirm("Update the connection string?")? {
        return Ok(false);
    }
    prompt_connection_string(console, settings)
}

/// Shows examples, reads a connection string and persists it.
///
/// Blank input and write failures are reported; the returned flag says
/// whether a new value was saved.
pub fn prompt_connection_string<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    settings: &mut SettingsFile,
) -> ConsoleResult<bool> {
    console.blank_line()?;
    console.say("Connection string examples:")?;
    for (index, example) in CONNECTION_STRING_EXAMPLES.iter().enumerate() {
        console.say(format!("{}. {example}", index + 1))?;
    }
    console.blank_line()?;

    let answer = console.read_line("Connection string: ")?;
    if answer.trim().is_empty() {
        console.say("The connection string cannot be empty.")?;
        return Ok(false);
    }

    match settings.update_connection_string(&answer) {
        Ok(()) => {
            console.say("Connection string updated.")?;
            console.say("Restart the application to use it.")?;
            Ok(true)
        }
        Err(err) => {
            warn!("event=settings_update module=console status=error error={err}");
            console.say(format!("Could not update the connection string: {err}"))?;
            Ok(false)
        }
    }
}

/// Offers to rewrite a settings file that could not be loaded.
///
/// On yes, writes fresh default settings to `path` and prompts for the
/// connection string. Returns whether a new value was saved.
pub fn offer_settings_rewrite<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    path: &Path,
) -> ConsoleResult<bool> {
    console.blank_line()?;
    if !console.confirm(&format!(
        "Rewrite {} with a new connection string?",
        path.display()
    ))? {
        return Ok(false);
    }

    match SettingsFile::create_default(path) {
        Ok(mut settings) => prompt_connection_string(console, &mut settings),
        Err(err) => {
            console.say(format!("Could not rewrite the settings file: {err}"))?;
            Ok(false)
        }
    }
}
