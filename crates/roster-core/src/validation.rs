//! Client-side field validation
//!
//! Validation happens at the input boundary, before any network call. A
//! successful check yields a [`Validated`] wrapper, which is the only form the
//! mutation coordinator accepts, so field violations can never reach it.

use crate::model::{EmployeeChanges, NewEmployee};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Minimum password length accepted for new accounts
pub const MIN_PASSWORD_LEN: usize = 6;
/// Inclusive age bounds
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 18..=100;
/// Inclusive attendance bounds, in percent
pub const ATTENDANCE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// A single field constraint violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every violation found in one input, reported together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Message for a single field, if it failed
    pub fn field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    fn into_result<T>(self, value: T) -> Result<Validated<T>, ValidationErrors> {
        if self.0.is_empty() {
            Ok(Validated(value))
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Input that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", label));
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.push("email", "Invalid email format");
    }
}

fn check_age(errors: &mut ValidationErrors, age: u32) {
    if age == 0 {
        errors.push("age", "Age is required");
    } else if !AGE_RANGE.contains(&age) {
        errors.push("age", "Age must be between 18 and 100");
    }
}

fn check_attendance(errors: &mut ValidationErrors, attendance: f64) {
    if !ATTENDANCE_RANGE.contains(&attendance) {
        errors.push("attendance", "Attendance must be between 0 and 100");
    }
}

/// Drop blank subject entries, keeping order
fn clean_subjects(subjects: Vec<String>) -> Vec<String> {
    subjects
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl NewEmployee {
    /// Check every creation constraint, collecting all violations
    pub fn validate(mut self) -> Result<Validated<NewEmployee>, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_required(&mut errors, "name", &self.name, "Name");
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        check_required(&mut errors, "phone", &self.phone, "Phone");
        check_age(&mut errors, self.age);
        check_required(&mut errors, "class", &self.class, "Class");
        check_attendance(&mut errors, self.attendance);

        self.subjects = clean_subjects(std::mem::take(&mut self.subjects));
        errors.into_result(self)
    }
}

impl EmployeeChanges {
    /// Check only the fields being changed
    pub fn validate(mut self) -> Result<Validated<EmployeeChanges>, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.is_empty() {
            errors.push("changes", "No fields to update");
        }
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", name, "Name");
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(phone) = &self.phone {
            check_required(&mut errors, "phone", phone, "Phone");
        }
        if let Some(age) = self.age {
            check_age(&mut errors, age);
        }
        if let Some(class) = &self.class {
            check_required(&mut errors, "class", class, "Class");
        }
        if let Some(attendance) = self.attendance {
            check_attendance(&mut errors, attendance);
        }

        self.subjects = self.subjects.take().map(clean_subjects);
        errors.into_result(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jo() -> NewEmployee {
        NewEmployee::new("Jo", "jo@x.com", "abcdef")
            .with_phone("555")
            .with_age(25)
            .with_class("A")
    }

    #[test]
    fn test_valid_new_employee_passes() {
        let validated = jo().validate().unwrap();
        assert_eq!(validated.name, "Jo");
        assert!(validated.subjects.is_empty());
    }

    #[test]
    fn test_collects_every_violation() {
        let input = NewEmployee::new("", "not-an-email", "abc").with_age(12);
        let errors = input.validate().unwrap_err();

        assert_eq!(errors.field("name"), Some("Name is required"));
        assert_eq!(errors.field("email"), Some("Invalid email format"));
        assert_eq!(
            errors.field("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.field("phone"), Some("Phone is required"));
        assert_eq!(errors.field("age"), Some("Age must be between 18 and 100"));
        assert_eq!(errors.field("class"), Some("Class is required"));
    }

    #[test]
    fn test_blank_subjects_are_dropped() {
        let validated = jo()
            .with_subjects(["math", "  ", "", "art "])
            .validate()
            .unwrap();
        assert_eq!(validated.subjects, vec!["math", "art"]);
    }

    #[test]
    fn test_attendance_bounds() {
        let errors = jo().with_attendance(100.5).validate().unwrap_err();
        assert!(errors.field("attendance").is_some());
        assert!(jo().with_attendance(100.0).validate().is_ok());
    }

    #[test]
    fn test_changes_only_check_present_fields() {
        assert!(EmployeeChanges::new().phone("555-0101").validate().is_ok());

        let errors = EmployeeChanges::new().age(101).validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].field, "age");
    }

    #[test]
    fn test_empty_changes_rejected() {
        let errors = EmployeeChanges::new().validate().unwrap_err();
        assert!(errors.field("changes").is_some());
    }
}
