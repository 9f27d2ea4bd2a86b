//! User validation utilities
//!
//! Two layers live here. [`UserValidationError`] covers the invariants the
//! aggregate enforces on construction and mutation. The `check_*` functions and
//! patterns are the field-format rules applied to incoming requests through
//! `validator` before any lookup happens.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use super::entity::UserId;
use crate::domain::{Failure, FailureKind};

/// Errors raised when a user aggregate invariant would be broken
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Password hash cannot be empty")]
    EmptyPasswordHash,

    #[error("First name cannot be empty")]
    EmptyFirstName,

    #[error("Last name cannot be empty")]
    EmptyLastName,

    #[error("Invalid user ID: '{0}'")]
    InvalidUserId(String),

    #[error("Unknown account type: '{0}'. Expected Buyer, Seller or Both")]
    UnknownAccountType(String),

    #[error("Unknown verification method: '{0}'")]
    UnknownVerificationMethod(String),

    #[error("A verification method must be given to mark a user as verified")]
    MissingVerificationMethod,

    #[error("A verified status must carry a verification timestamp")]
    MissingVerificationTimestamp,

    #[error("Reputation adjustment must be a finite number")]
    NonFiniteReputationDelta,

    #[error("Reputation score {0} is outside the range 0 to 100")]
    ReputationOutOfRange(f64),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,

    #[error("Password must contain at least one digit")]
    PasswordMissingDigit,

    #[error("Password must contain at least one special character")]
    PasswordMissingSpecial,
}

pub const MAX_EMAIL_LENGTH: u64 = 256;
pub const MAX_NAME_LENGTH: u64 = 50;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 100;
pub const MAX_BIO_LENGTH: u64 = 500;
pub const MAX_LOCATION_LENGTH: u64 = 100;
pub const MAX_AVATAR_URL_LENGTH: u64 = 500;
pub const MAX_NOTES_LENGTH: u64 = 1000;

/// Letters plus space, apostrophe, hyphen and period
pub static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}][\p{L} '.\-]*$").unwrap());

static HTTP_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)https?://[^\s/$.?#][^\s]*$").unwrap());

/// Lower-case and trim an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collect every composition rule the password breaks.
///
/// Rules:
/// - 8 to 100 characters
/// - at least one uppercase letter, lowercase letter, digit and special character
pub fn password_violations(password: &str) -> Vec<UserValidationError> {
    let mut violations = Vec::new();
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        violations.push(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        violations.push(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    if !password.chars().any(char::is_uppercase) {
        violations.push(UserValidationError::PasswordMissingUppercase);
    }

    if !password.chars().any(char::is_lowercase) {
        violations.push(UserValidationError::PasswordMissingLowercase);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(UserValidationError::PasswordMissingDigit);
    }

    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        violations.push(UserValidationError::PasswordMissingSpecial);
    }

    violations
}

/// `validator` hook for password composition
pub fn check_password_strength(password: &str) -> Result<(), ValidationError> {
    let violations = password_violations(password);

    if violations.is_empty() {
        return Ok(());
    }

    let message = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    Err(validation_error("password_strength", message))
}

/// `validator` hook requiring an absolute http or https URL
pub fn check_http_url(url: &str) -> Result<(), ValidationError> {
    if HTTP_URL_PATTERN.is_match(url) {
        Ok(())
    } else {
        Err(validation_error(
            "http_url",
            "Avatar URL must be an absolute http or https URL",
        ))
    }
}

/// `validator` hook rejecting blank strings that still pass a length check
pub fn check_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(validation_error("blank", "Value cannot be blank"))
    } else {
        Ok(())
    }
}

/// `validator` hook rejecting the unassigned (nil) user id
pub fn check_user_id(id: &UserId) -> Result<(), ValidationError> {
    if id.is_nil() {
        Err(validation_error("user_id", "User ID is required"))
    } else {
        Ok(())
    }
}

fn validation_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message.into()));
    error
}

/// Flatten `validator` errors into one validation failure, one message per
/// broken rule, sorted so reports are stable.
pub fn failure_from_errors(errors: &ValidationErrors) -> Failure {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid ({})", field, error.code),
            })
        })
        .collect();

    messages.sort();
    messages.dedup();

    Failure::with_messages(FailureKind::Validation, messages)
}

impl From<UserValidationError> for Failure {
    fn from(error: UserValidationError) -> Self {
        Failure::validation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  John.Doe@Example.COM "), "john.doe@example.com");
    }

    #[test]
    fn test_valid_password() {
        assert!(password_violations("SecurePass123!").is_empty());
    }

    #[test]
    fn test_weak_password_reports_every_missing_class() {
        let violations = password_violations("password");

        assert_eq!(
            violations,
            vec![
                UserValidationError::PasswordMissingUppercase,
                UserValidationError::PasswordMissingDigit,
                UserValidationError::PasswordMissingSpecial,
            ]
        );
    }

    #[test]
    fn test_password_length_bounds() {
        assert_eq!(
            password_violations("Ab1!"),
            vec![UserValidationError::PasswordTooShort(8)]
        );

        let long = format!("Ab1!{}", "a".repeat(97));
        assert_eq!(
            password_violations(&long),
            vec![UserValidationError::PasswordTooLong(100)]
        );
    }

    #[test]
    fn test_check_password_strength_message() {
        let error = check_password_strength("password").unwrap_err();
        let message = error.message.unwrap();

        assert!(message.contains("uppercase"));
        assert!(message.contains("digit"));
        assert!(message.contains("special"));
    }

    #[test]
    fn test_name_pattern() {
        assert!(NAME_PATTERN.is_match("John"));
        assert!(NAME_PATTERN.is_match("Mary-Jane"));
        assert!(NAME_PATTERN.is_match("O'Brien"));
        assert!(NAME_PATTERN.is_match("José"));
        assert!(NAME_PATTERN.is_match("St. John"));
        assert!(!NAME_PATTERN.is_match("R2D2"));
        assert!(!NAME_PATTERN.is_match("-John"));
        assert!(!NAME_PATTERN.is_match(""));
    }

    #[test]
    fn test_check_http_url() {
        assert!(check_http_url("https://cdn.example.com/a.png").is_ok());
        assert!(check_http_url("http://example.com").is_ok());
        assert!(check_http_url("ftp://example.com/a.png").is_err());
        assert!(check_http_url("/relative/a.png").is_err());
        assert!(check_http_url("https://").is_err());
    }

    #[test]
    fn test_check_not_blank() {
        assert!(check_not_blank("x").is_ok());
        assert!(check_not_blank("   ").is_err());
    }

    #[test]
    fn test_check_user_id() {
        assert!(check_user_id(&UserId::generate()).is_ok());
        assert!(check_user_id(&UserId::default()).is_err());
    }

    #[test]
    fn test_failure_from_user_validation_error() {
        let failure: Failure = UserValidationError::EmptyEmail.into();

        assert_eq!(failure.kind(), FailureKind::Validation);
        assert_eq!(failure.messages(), ["Email cannot be empty".to_string()]);
    }
}
