//! Verification status owned by a user

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::UserValidationError;

/// How a user's identity was verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerificationMethod {
    #[default]
    None,
    Email,
    Phone,
    Document,
    Manual,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Document => "Document",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMethod {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "document" => Ok(Self::Document),
            "manual" => Ok(Self::Manual),
            _ => Err(UserValidationError::UnknownVerificationMethod(s.to_string())),
        }
    }
}

/// Verification state of a user.
///
/// Invariant: `verified` implies a method other than `None` and a timestamp.
/// Revoking clears both the flag and the timestamp; the history survives in
/// `notes`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationStatus {
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
    method: VerificationMethod,
    notes: Option<String>,
}

impl VerificationStatus {
    /// The state every new user starts in
    pub fn unverified() -> Self {
        Self {
            verified: false,
            verified_at: None,
            method: VerificationMethod::None,
            notes: None,
        }
    }

    /// Rebuild a status loaded from storage, checking the invariant
    pub fn restore(
        verified: bool,
        verified_at: Option<DateTime<Utc>>,
        method: VerificationMethod,
        notes: Option<String>,
    ) -> Result<Self, UserValidationError> {
        if verified {
            if method == VerificationMethod::None {
                return Err(UserValidationError::MissingVerificationMethod);
            }
            if verified_at.is_none() {
                return Err(UserValidationError::MissingVerificationTimestamp);
            }
        }

        Ok(Self {
            verified,
            verified_at: if verified { verified_at } else { None },
            method,
            notes,
        })
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn method(&self) -> VerificationMethod {
        self.method
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub(super) fn verify(
        &mut self,
        method: VerificationMethod,
        notes: Option<String>,
    ) -> Result<(), UserValidationError> {
        if method == VerificationMethod::None {
            return Err(UserValidationError::MissingVerificationMethod);
        }

        self.verified = true;
        self.verified_at = Some(Utc::now());
        self.method = method;

        if let Some(notes) = notes {
            self.append_note(notes);
        }

        Ok(())
    }

    pub(super) fn revoke(&mut self, reason: &str) {
        let entry = format!(
            "Verification via {} revoked at {}: {}",
            self.method,
            Utc::now().to_rfc3339(),
            reason.trim()
        );

        self.verified = false;
        self.verified_at = None;
        self.append_note(entry);
    }

    fn append_note(&mut self, note: String) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, note),
            _ => note,
        });
    }
}

impl Default for VerificationStatus {
    fn default() -> Self {
        Self::unverified()
    }
}
