//! Menu loop and per-action employee flows.
//!
//! # Responsibility
//! - Own the service, settings and console for one interactive run.
//! - Collect fields through retry-until-valid prompts and dispatch to the
//!   service.
//! - Report flow failures and keep the menu running.
//!
//! # Invariants
//! - `create` is only reached after every field passed validation.
//! - Update writes the full fetched record with the chosen fields replaced.
//! - Delete requires an explicit yes; any other answer is a no-op.

use super::fields::{parse_date_of_birth, parse_email, parse_name, parse_salary, FieldError};
use super::startup::prompt_connection_string;
use super::{Console, ConsoleError, ConsoleResult};
use crate::config::{ConfigError, SettingsFile};
use crate::model::employee::{Employee, EmployeeId, NewEmployee, Salary};
use crate::repo::employee_repo::{EmployeeRepository, RepoError, RepoResult};
use crate::service::employee_service::EmployeeService;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

/// Source of "today" for date-of-birth checks.
pub type Clock = fn() -> NaiveDate;

/// Current local date.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    Console(ConsoleError),
    Repo(RepoError),
    Config(ConfigError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Console(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Console(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConsoleError> for SessionError {
    fn from(value: ConsoleError) -> Self {
        Self::Console(value)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::Console(ConsoleError::Io(value))
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ConfigError> for SessionError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Main menu entries, numbered 1..=7 in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddEmployee,
    ListEmployees,
    UpdateEmployee,
    DeleteEmployee,
    SalaryReport,
    SetConnectionString,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 7] = [
        Self::AddEmployee,
        Self::ListEmployees,
        Self::UpdateEmployee,
        Self::DeleteEmployee,
        Self::SalaryReport,
        Self::SetConnectionString,
        Self::Exit,
    ];

    /// Maps a 1-based menu number to its action.
    pub fn from_choice(choice: usize) -> Option<Self> {
        choice
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AddEmployee => "Add a new employee",
            Self::ListEmployees => "List all employees",
            Self::UpdateEmployee => "Update an employee",
            Self::DeleteEmployee => "Delete an employee",
            Self::SalaryReport => "Employees earning above the average salary",
            Self::SetConnectionString => "Set the connection string",
            Self::Exit => "Exit",
        }
    }

    fn log_name(self) -> &'static str {
        match self {
            Self::AddEmployee => "add",
            Self::ListEmployees => "list",
            Self::UpdateEmployee => "update",
            Self::DeleteEmployee => "delete",
            Self::SalaryReport => "report",
            Self::SetConnectionString => "set_connection_string",
            Self::Exit => "exit",
        }
    }
}

/// Field picked in the update flow, numbered 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    Salary,
    All,
}

impl EditableField {
    pub const ALL: [EditableField; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::DateOfBirth,
        Self::Salary,
        Self::All,
    ];

    pub fn from_choice(choice: usize) -> Option<Self> {
        choice
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Email => "Email",
            Self::DateOfBirth => "Date of birth",
            Self::Salary => "Salary",
            Self::All => "All fields",
        }
    }

    fn covers(self, field: EditableField) -> bool {
        self == field || self == Self::All
    }
}

/// One interactive run: the explicit context passed to every flow.
pub struct Session<R: EmployeeRepository, I, O> {
    service: EmployeeService<R>,
    settings: SettingsFile,
    console: Console<I, O>,
    clock: Clock,
}

impl<R: EmployeeRepository, I: BufRead, O: Write> Session<R, I, O> {
    pub fn new(service: EmployeeService<R>, settings: SettingsFile, console: Console<I, O>) -> Self {
        Self {
            service,
            settings,
            console,
            clock: local_today,
        }
    }

    /// Replaces the date source used by date-of-birth checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the menu until Exit is chosen or input closes.
    pub fn run(&mut self) -> SessionResult<()> {
        info!("event=session_start module=console status=ok");
        match self.menu_loop() {
            Ok(()) => {
                info!("event=session_end module=console status=ok reason=exit");
                Ok(())
            }
            Err(SessionError::Console(ConsoleError::InputClosed)) => {
                info!("event=session_end module=console status=ok reason=input_closed");
                Ok(())
            }
            Err(err) => {
                error!("event=session_end module=console status=error error={err}");
                Err(err)
            }
        }
    }

    /// Runs one menu action.
    pub fn perform(&mut self, action: MenuAction) -> SessionResult<()> {
        info!(
            "event=menu_action module=console action={} status=start",
            action.log_name()
        );
        match action {
            MenuAction::AddEmployee => self.add_employee().map(|_| ()),
            MenuAction::ListEmployees => self.list_employees().map(|_| ()),
            MenuAction::UpdateEmployee => self.update_employee(),
            MenuAction::DeleteEmployee => self.delete_employee(),
            MenuAction::SalaryReport => self.salary_report(),
            MenuAction::SetConnectionString => {
                prompt_connection_string(&mut self.console, &mut self.settings)?;
                Ok(())
            }
            MenuAction::Exit => Ok(()),
        }
    }

    /// Releases the store. Safe to call more than once.
    pub fn close(&mut self) -> RepoResult<()> {
        self.service.close()
    }

    pub fn service_mut(&mut self) -> &mut EmployeeService<R> {
        &mut self.service
    }

    pub fn settings(&self) -> &SettingsFile {
        &self.settings
    }

    pub fn console(&self) -> &Console<I, O> {
        &self.console
    }

    pub fn into_parts(self) -> (EmployeeService<R>, SettingsFile, Console<I, O>) {
        (self.service, self.settings, self.console)
    }

    fn menu_loop(&mut self) -> SessionResult<()> {
        loop {
            self.show_menu()?;
            let action = self.read_menu_choice()?;
            if action == MenuAction::Exit {
                return Ok(());
            }

            match self.perform(action) {
                Ok(()) => {}
                Err(SessionError::Console(err)) => return Err(SessionError::Console(err)),
                Err(err) => self.report_failure(action, &err)?,
            }

            self.console.blank_line()?;
            self.console.pause("Press Enter to continue...")?;
        }
    }

    fn show_menu(&mut self) -> ConsoleResult<()> {
        self.console.blank_line()?;
        self.console.say("Employee records")?;
        self.console.blank_line()?;
        for (index, action) in MenuAction::ALL.iter().enumerate() {
            self.console.say(format!("{}. {}", index + 1, action.label()))?;
        }
        self.console.blank_line()
    }

    fn read_menu_choice(&mut self) -> ConsoleResult<MenuAction> {
        let last = MenuAction::ALL.len();
        let mut prompt = format!("Choose an option (1-{last}): ");
        loop {
            let answer = self.console.read_line(&prompt)?;
            if let Some(action) = answer.trim().parse().ok().and_then(MenuAction::from_choice) {
                return Ok(action);
            }
            prompt = format!("The option must be a number from 1 to {last}: ");
        }
    }

    fn report_failure(&mut self, action: MenuAction, err: &SessionError) -> ConsoleResult<()> {
        warn!(
            "event=menu_action module=console action={} status=error error={}",
            action.log_name(),
            err
        );
        match err {
            SessionError::Repo(RepoError::NotFound(id)) => {
                self.console.say(format!("Employee {id} was not found."))
            }
            SessionError::Repo(RepoError::Storage { .. }) => {
                self.console.say(format!("Error: {err}"))?;
                self.console.say(format!(
                    "Check that the database is reachable and that the connection string in {} is correct (option 6).",
                    self.settings.path().display()
                ))
            }
            _ => self.console.say(format!("Error: {err}")),
        }
    }

    /// Add flow. Returns the new id.
    pub fn add_employee(&mut self) -> SessionResult<EmployeeId> {
        self.console.blank_line()?;
        self.console.say("New employee")?;

        let employee = NewEmployee {
            first_name: self.prompt_name("First name")?,
            last_name: self.prompt_name("Last name")?,
            email: self.prompt_email(None)?,
            date_of_birth: self.prompt_date_of_birth()?,
            salary: self.prompt_salary()?,
        };

        let id = self.service.create_employee(&employee)?;
        self.console.say(format!("Employee added with ID {id}."))?;
        Ok(id)
    }

    /// List flow. Returns the printed records.
    pub fn list_employees(&mut self) -> SessionResult<Vec<Employee>> {
        let employees = self.service.list_employees()?;
        self.print_employees(&employees)?;
        Ok(employees)
    }

    /// Update flow.
    pub fn update_employee(&mut self) -> SessionResult<()> {
        self.console.blank_line()?;
        self.console.say("Update employee")?;

        let Some(mut employee) = self.select_employee()? else {
            return Ok(());
        };

        self.console.blank_line()?;
        self.console.say(format!("Current record: {employee}"))?;
        self.console.blank_line()?;
        self.console.say("Editable fields:")?;
        for (index, field) in EditableField::ALL.iter().enumerate() {
            self.console.say(format!("{}. {}", index + 1, field.label()))?;
        }

        let answer = self
            .console
            .read_line(&format!("Choose a field (1-{}): ", EditableField::ALL.len()))?;
        let Some(choice) = answer.trim().parse().ok().and_then(EditableField::from_choice) else {
            self.console.say("Invalid field choice.")?;
            return Ok(());
        };

        if choice.covers(EditableField::FirstName) {
            employee.first_name = self.prompt_name("First name")?;
        }
        if choice.covers(EditableField::LastName) {
            employee.last_name = self.prompt_name("Last name")?;
        }
        if choice.covers(EditableField::Email) {
            employee.email = self.prompt_email(Some(employee.id))?;
        }
        if choice.covers(EditableField::DateOfBirth) {
            employee.date_of_birth = self.prompt_date_of_birth()?;
        }
        if choice.covers(EditableField::Salary) {
            employee.salary = self.prompt_salary()?;
        }

        self.service.update_employee(&employee)?;
        self.console.say("Employee updated.")?;
        Ok(())
    }

    /// Delete flow.
    pub fn delete_employee(&mut self) -> SessionResult<()> {
        self.console.blank_line()?;
        self.console.say("Delete employee")?;

        let Some(employee) = self.select_employee()? else {
            return Ok(());
        };

        self.console.blank_line()?;
        self.console.say(format!("Confirm deletion of: {employee}"))?;
        if self.console.confirm("Are you sure?")? {
            self.service.delete_employee(employee.id)?;
            self.console.say("Employee deleted.")?;
        } else {
            info!(
                "event=employee_delete module=console status=cancelled employee_id={}",
                employee.id
            );
            self.console.say("Deletion cancelled.")?;
        }
        Ok(())
    }

    /// Above-average salary report.
    pub fn salary_report(&mut self) -> SessionResult<()> {
        let report = self.service.above_average_report()?;
        let Some(mean) = report.mean_salary else {
            self.console.say("No employees found.")?;
            return Ok(());
        };

        self.console.blank_line()?;
        self.console.say(format!("Average salary: {mean}"))?;
        self.console.say(format!(
            "Employees earning above the average ({}):",
            report.store_count
        ))?;
        self.console.blank_line()?;
        for employee in &report.above_average {
            self.console.say(format!(
                "- {}: {}",
                employee.full_name(),
                employee.salary
            ))?;
        }
        if !report.counts_agree() {
            self.console.say(format!(
                "Warning: the database counted {} employees but {} are listed.",
                report.store_count,
                report.above_average.len()
            ))?;
        }
        Ok(())
    }

    fn print_employees(&mut self, employees: &[Employee]) -> ConsoleResult<()> {
        if employees.is_empty() {
            return self.console.say("No employees found.");
        }

        self.console.blank_line()?;
        self.console.say("Employees")?;
        self.console.blank_line()?;
        for employee in employees {
            self.console.say(employee)?;
        }
        self.console.blank_line()?;
        self.console.say(format!("Total employees: {}", employees.len()))
    }

    /// Lists employees and reads an id. `None` when the flow should stop.
    fn select_employee(&mut self) -> SessionResult<Option<Employee>> {
        let employees = self.service.list_employees()?;
        self.print_employees(&employees)?;
        if employees.is_empty() {
            return Ok(None);
        }

        self.console.blank_line()?;
        let answer = self.console.read_line("Employee ID: ")?;
        let Ok(id) = answer.trim().parse::<EmployeeId>() else {
            self.console.say("Employee ID must be a whole number.")?;
            return Ok(None);
        };

        Ok(Some(self.service.require_employee(id)?))
    }

    /// Repeats `prompt` until `check` accepts the answer.
    fn prompt_until<T>(
        &mut self,
        prompt: &str,
        mut check: impl FnMut(&mut Self, &str) -> SessionResult<Result<T, FieldError>>,
    ) -> SessionResult<T> {
        loop {
            let answer = self.console.read_line(prompt)?;
            match check(self, &answer)? {
                Ok(value) => return Ok(value),
                Err(rejection) => self.console.say(&rejection)?,
            }
        }
    }

    fn prompt_name(&mut self, field: &'static str) -> SessionResult<String> {
        self.prompt_until(&format!("{field}: "), |_, answer| {
            Ok(parse_name(answer, field))
        })
    }

    fn prompt_email(&mut self, exclude_id: Option<EmployeeId>) -> SessionResult<String> {
        self.prompt_until("Email: ", |session, answer| {
            let email = match parse_email(answer) {
                Ok(email) => email,
                Err(rejection) => return Ok(Err(rejection)),
            };
            if session.service.email_in_use(&email, exclude_id)? {
                return Ok(Err(FieldError::EmailInUse));
            }
            Ok(Ok(email))
        })
    }

    fn prompt_date_of_birth(&mut self) -> SessionResult<NaiveDate> {
        let today = (self.clock)();
        self.prompt_until("Date of birth (yyyy-mm-dd): ", |_, answer| {
            Ok(parse_date_of_birth(answer, today))
        })
    }

    fn prompt_salary(&mut self) -> SessionResult<Salary> {
        self.prompt_until("Salary: ", |_, answer| Ok(parse_salary(answer)))
    }
}
