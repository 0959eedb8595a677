//! The acceptance rule for new users.
//!
//! Checks run in a fixed order and the first failure wins, so a form with
//! several problems always reports the same one.

use crate::{domain::NewUser, error::ValidationError};

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 150;

#[derive(Debug, Clone, Copy)]
pub(crate) enum AgeInput<'a> {
    Text(&'a str),
    Number(i64),
}

impl AgeInput<'_> {
    fn parse(self) -> Option<u8> {
        let age = match self {
            AgeInput::Text(raw) => raw.parse::<i64>().ok()?,
            AgeInput::Number(age) => age,
        };
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return None;
        }
        u8::try_from(age).ok()
    }
}

pub(crate) fn validate_fields(
    name: &str,
    age: AgeInput<'_>,
    job_title: &str,
    gender: &str,
) -> Result<NewUser, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }

    let age = age.parse().ok_or(ValidationError::AgeInvalid)?;

    let job_title = job_title.trim();
    if job_title.is_empty() {
        return Err(ValidationError::JobTitleRequired);
    }

    let gender = gender.trim();
    if gender.is_empty() {
        return Err(ValidationError::GenderRequired);
    }

    Ok(NewUser::from_validated(
        name.to_string(),
        age,
        job_title.to_string(),
        gender.to_string(),
    ))
}

/// Whether `raw` is acceptable as in-progress age input: empty, or digits only.
pub fn is_age_keystroke_valid(raw: &str) -> bool {
    raw.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
