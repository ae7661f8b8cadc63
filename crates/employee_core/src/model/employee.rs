//! Employee domain model.
//!
//! # Responsibility
//! - Define the employee record and its storage-assigned identity.
//! - Provide exact salary arithmetic for average comparisons.
//! - Enforce record-level invariants shared by every write path.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes afterwards.
//! - First/last names are non-empty after trimming.
//! - `email` is a syntactically valid address.
//! - `salary` is never negative (`Salary` cannot represent negatives).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned employee identifier.
pub type EmployeeId = i64;

/// Format used for dates in storage, prompts and display.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const CENTS_PER_UNIT: i64 = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("valid email regex")
});

/// Returns whether `email` is a syntactically valid address.
///
/// The input is checked as-is: surrounding whitespace makes it invalid.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    EmptyFirstName,
    EmptyLastName,
    InvalidEmail(String),
    NegativeSalary(i64),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::InvalidEmail(email) => write!(f, "`{email}` is not a valid email address"),
            Self::NegativeSalary(cents) => {
                write!(f, "salary must not be negative (got {cents} cents)")
            }
        }
    }
}

impl Error for EmployeeValidationError {}

/// Non-negative monetary amount stored as whole cents.
///
/// Cents keep sums and average comparisons exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Salary(i64);

impl Salary {
    pub const ZERO: Salary = Salary(0);

    /// Builds a salary from whole cents, rejecting negative amounts.
    pub fn from_cents(cents: i64) -> Result<Self, EmployeeValidationError> {
        if cents < 0 {
            return Err(EmployeeValidationError::NegativeSalary(cents));
        }
        Ok(Self(cents))
    }

    /// Builds a salary from whole currency units.
    pub fn from_units(units: u32) -> Self {
        Self(i64::from(units) * CENTS_PER_UNIT)
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Salary {
    type Error = EmployeeValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_cents(value)
    }
}

impl From<Salary> for i64 {
    fn from(value: Salary) -> Self {
        value.0
    }
}

impl Display for Salary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

/// Why a salary string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSalaryError {
    Empty,
    Negative,
    Malformed,
    TooManyFractionDigits,
    Overflow,
}

impl Display for ParseSalaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "salary is empty"),
            Self::Negative => write!(f, "salary must not be negative"),
            Self::Malformed => write!(f, "salary must be a number like 1234.56"),
            Self::TooManyFractionDigits => write!(f, "salary has more than two decimal places"),
            Self::Overflow => write!(f, "salary is too large"),
        }
    }
}

impl Error for ParseSalaryError {}

impl FromStr for Salary {
    type Err = ParseSalaryError;

    /// Parses `1234`, `1234.5` or `1234.56`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ParseSalaryError::Empty);
        }
        if value.starts_with('-') {
            return Err(ParseSalaryError::Negative);
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (value, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseSalaryError::Malformed);
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ParseSalaryError::Malformed);
        }
        if fraction.len() > 2 {
            return Err(ParseSalaryError::TooManyFractionDigits);
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| ParseSalaryError::Overflow)?
        };
        let fraction_cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| ParseSalaryError::Malformed)? * 10,
            _ => fraction.parse::<i64>().map_err(|_| ParseSalaryError::Malformed)?,
        };

        whole_units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|cents| cents.checked_add(fraction_cents))
            .map(Salary)
            .ok_or(ParseSalaryError::Overflow)
    }
}

/// Employee fields before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub salary: Salary,
}

impl NewEmployee {
    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.email)
    }

    /// Attaches the storage-assigned id.
    pub fn with_id(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            salary: self.salary,
        }
    }
}

/// Persisted employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub salary: Salary,
}

impl Employee {
    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.email)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Display for Employee {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}, Name: {} {}, Email: {}, Date of Birth: {}, Salary: {}",
            self.id,
            self.first_name,
            self.last_name,
            self.email,
            self.date_of_birth.format(DATE_FORMAT),
            self.salary
        )
    }
}

fn validate_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<(), EmployeeValidationError> {
    if first_name.trim().is_empty() {
        return Err(EmployeeValidationError::EmptyFirstName);
    }
    if last_name.trim().is_empty() {
        return Err(EmployeeValidationError::EmptyLastName);
    }
    if !is_valid_email(email) {
        return Err(EmployeeValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
