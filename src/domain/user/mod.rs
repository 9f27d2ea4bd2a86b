//! User domain
//!
//! This module provides the user aggregate (root, profile and verification
//! status), its validation rules and the repository port.

mod entity;
mod profile;
mod repository;
mod validation;
mod verification;

pub use entity::{
    AccountType, User, UserId, UserState, DEFAULT_REPUTATION, MAX_REPUTATION, MIN_REPUTATION,
};
pub use profile::Profile;
pub use repository::{UserFilter, UserRepository};
pub use validation::{
    check_http_url, check_not_blank, check_password_strength, check_user_id, failure_from_errors,
    normalize_email, password_violations, UserValidationError,
    MAX_AVATAR_URL_LENGTH, MAX_BIO_LENGTH, MAX_EMAIL_LENGTH, MAX_LOCATION_LENGTH,
    MAX_NAME_LENGTH, MAX_NOTES_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, NAME_PATTERN,
};
pub use verification::{VerificationMethod, VerificationStatus};

#[cfg(test)]
pub use repository::MockUserRepository;
