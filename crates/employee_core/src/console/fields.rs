//! Input rules for employee fields.
//!
//! Each function checks one raw console answer and returns either the typed
//! value or the message the user sees before being asked again.

use crate::model::employee::{is_valid_email, ParseSalaryError, Salary, DATE_FORMAT};
use chrono::{Months, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Oldest allowed age, in years.
pub const MAX_AGE_YEARS: u32 = 100;

/// Rejected console answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required(&'static str),
    InvalidEmail,
    EmailInUse,
    InvalidDate,
    BirthDateInFuture,
    BirthDateTooOld { earliest_exclusive: NaiveDate },
    InvalidSalary(ParseSalaryError),
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required."),
            Self::InvalidEmail => write!(f, "Enter a valid email address."),
            Self::EmailInUse => write!(f, "This email is already used by another employee."),
            Self::InvalidDate => write!(f, "Enter the date as yyyy-mm-dd."),
            Self::BirthDateInFuture => write!(f, "Date of birth cannot be in the future."),
            Self::BirthDateTooOld { earliest_exclusive } => write!(
                f,
                "Date of birth must be after {}.",
                earliest_exclusive.format(DATE_FORMAT)
            ),
            Self::InvalidSalary(ParseSalaryError::Negative) => {
                write!(f, "Salary cannot be negative.")
            }
            Self::InvalidSalary(err) => write!(f, "Invalid salary: {err}."),
        }
    }
}

impl Error for FieldError {}

/// Non-empty after trimming; returns the trimmed value.
pub fn parse_name(input: &str, field: &'static str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Non-empty and syntactically valid; returns the trimmed value.
///
/// Uniqueness needs the store and is checked by the caller.
pub fn parse_email(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required("Email"));
    }
    if !is_valid_email(trimmed) {
        return Err(FieldError::InvalidEmail);
    }
    Ok(trimmed.to_string())
}

/// `yyyy-mm-dd`, with `today - 100 years < dob <= today`.
pub fn parse_date_of_birth(input: &str, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| FieldError::InvalidDate)?;

    if date > today {
        return Err(FieldError::BirthDateInFuture);
    }
    let earliest_exclusive = earliest_birth_date_exclusive(today);
    if date <= earliest_exclusive {
        return Err(FieldError::BirthDateTooOld { earliest_exclusive });
    }
    Ok(date)
}

/// Non-negative decimal with at most two fraction digits.
pub fn parse_salary(input: &str) -> Result<Salary, FieldError> {
    input.parse::<Salary>().map_err(FieldError::InvalidSalary)
}

/// `today` minus [`MAX_AGE_YEARS`]; birth dates must be strictly later.
///
/// Feb 29 maps to Feb 28 when the target year is not a leap year.
pub fn earliest_birth_date_exclusive(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}
