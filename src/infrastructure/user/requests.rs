//! Command shapes accepted by the user service
//!
//! Each request carries its own field-format rules through `validator`. The
//! service runs them before touching the repository.

use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::user::{
    check_http_url, check_not_blank, check_password_strength, check_user_id, AccountType,
    UserId, VerificationMethod, MAX_AVATAR_URL_LENGTH, MAX_BIO_LENGTH, MAX_EMAIL_LENGTH,
    MAX_LOCATION_LENGTH, MAX_NAME_LENGTH, MAX_NOTES_LENGTH, NAME_PATTERN,
};

/// Request for registering a new user
#[derive(Debug, Clone, Validate)]
pub struct RegisterUserRequest {
    #[validate(
        length(min = 1, max = MAX_EMAIL_LENGTH, message = "Email is required and must be at most 256 characters"),
        email(message = "Email must be a valid email address")
    )]
    pub email: String,

    #[validate(custom(function = "check_password_strength"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Password and confirmation do not match"))]
    pub confirm_password: String,

    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "First name must be between 1 and 50 characters"),
        regex(path = *NAME_PATTERN, message = "First name may only contain letters, spaces, apostrophes, hyphens and periods")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "Last name must be between 1 and 50 characters"),
        regex(path = *NAME_PATTERN, message = "Last name may only contain letters, spaces, apostrophes, hyphens and periods")
    )]
    pub last_name: String,

    pub account_type: AccountType,
}

impl RegisterUserRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            account_type,
        }
    }

    /// Trim surrounding whitespace from the email and names. Passwords are kept verbatim.
    pub fn trimmed(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }
}

/// Partial update of a user's names and profile.
///
/// `None` leaves a field unchanged. For profile fields `Some(None)` clears the
/// stored value and `Some(Some(value))` replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateUserRequest {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
}

impl UpdateUserRequest {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(Some(bio.into()));
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(Some(location.into()));
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(Some(avatar_url.into()));
        self
    }

    pub fn clear_bio(mut self) -> Self {
        self.bio = Some(None);
        self
    }

    pub fn clear_location(mut self) -> Self {
        self.location = Some(None);
        self
    }

    pub fn clear_avatar_url(mut self) -> Self {
        self.avatar_url = Some(None);
        self
    }

    pub fn has_name_changes(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn has_profile_changes(&self) -> bool {
        self.bio.is_some() || self.location.is_some() || self.avatar_url.is_some()
    }

    /// Trim any supplied name
    pub fn trimmed(mut self) -> Self {
        self.first_name = self.first_name.map(|name| name.trim().to_string());
        self.last_name = self.last_name.map(|name| name.trim().to_string());
        self
    }
}

// Hand-written because the derive cannot see through the nested `Option` of
// the clearable profile fields.
impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(error) = check_user_id(&self.user_id) {
            errors.add("user_id", error);
        }

        if let Some(first_name) = &self.first_name {
            for error in name_errors(first_name, "First name") {
                errors.add("first_name", error);
            }
        }

        if let Some(last_name) = &self.last_name {
            for error in name_errors(last_name, "Last name") {
                errors.add("last_name", error);
            }
        }

        if let Some(Some(bio)) = &self.bio {
            if let Err(error) = check_max_length(bio, MAX_BIO_LENGTH, "Bio") {
                errors.add("bio", error);
            }
        }

        if let Some(Some(location)) = &self.location {
            if let Err(error) = check_max_length(location, MAX_LOCATION_LENGTH, "Location") {
                errors.add("location", error);
            }
        }

        if let Some(Some(avatar_url)) = &self.avatar_url {
            if let Err(error) =
                check_max_length(avatar_url, MAX_AVATAR_URL_LENGTH, "Avatar URL")
            {
                errors.add("avatar_url", error);
            }
            if let Err(error) = check_http_url(avatar_url) {
                errors.add("avatar_url", error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn name_errors(name: &str, label: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let length = name.chars().count() as u64;

    if length == 0 || length > MAX_NAME_LENGTH {
        errors.push(message_error(
            "length",
            format!("{} must be between 1 and {} characters", label, MAX_NAME_LENGTH),
        ));
    }

    if !NAME_PATTERN.is_match(name) {
        errors.push(message_error(
            "regex",
            format!(
                "{} may only contain letters, spaces, apostrophes, hyphens and periods",
                label
            ),
        ));
    }

    errors
}

fn check_max_length(value: &str, max: u64, label: &str) -> Result<(), ValidationError> {
    if value.chars().count() as u64 > max {
        Err(message_error(
            "length",
            format!("{} must be at most {} characters", label, max),
        ))
    } else {
        Ok(())
    }
}

fn message_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Request for marking a user as verified
#[derive(Debug, Clone, Validate)]
pub struct VerifyUserRequest {
    #[validate(custom(function = "check_user_id"))]
    pub user_id: UserId,

    pub method: VerificationMethod,

    #[validate(length(max = MAX_NOTES_LENGTH, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Request for revoking a user's verification
#[derive(Debug, Clone, Validate)]
pub struct RevokeVerificationRequest {
    #[validate(custom(function = "check_user_id"))]
    pub user_id: UserId,

    #[validate(
        length(min = 1, max = MAX_NOTES_LENGTH, message = "Reason must be between 1 and 1000 characters"),
        custom(function = "check_not_blank")
    )]
    pub reason: String,
}

/// Request for applying a signed reputation delta
#[derive(Debug, Clone, Validate)]
pub struct AdjustReputationRequest {
    #[validate(custom(function = "check_user_id"))]
    pub user_id: UserId,

    pub points: f64,
}

/// Request for replacing a user's password
#[derive(Debug, Clone, Validate)]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "check_user_id"))]
    pub user_id: UserId,

    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(custom(function = "check_password_strength"))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Password and confirmation do not match"))]
    pub confirm_password: String,
}
