//! Outcome of a user-facing operation
//!
//! Every orchestrator returns `Result<Outcome<T>, DomainError>`. The outer
//! `Result` carries unexpected infrastructure failures; the `Outcome` carries
//! everything a caller is expected to handle: a value, a bare success, or a
//! failure with one or more human-readable messages.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Category of an expected failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input, detected without any I/O
    Validation,
    /// A rule that needed a lookup to check, such as email uniqueness
    BusinessRule,
    /// The referenced user does not exist
    NotFound,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "Validation failed"),
            Self::BusinessRule => write!(f, "Business rule violated"),
            Self::NotFound => write!(f, "Not found"),
        }
    }
}

/// An expected failure with at least one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}: {}", .messages.join("; "))]
pub struct Failure {
    kind: FailureKind,
    messages: Vec<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            messages: vec![message.into()],
        }
    }

    /// Build a failure from several messages. An empty list still yields one
    /// generic message so a failure is never silent.
    pub fn with_messages(kind: FailureKind, messages: Vec<String>) -> Self {
        let messages = if messages.is_empty() {
            vec![kind.to_string()]
        } else {
            messages
        };

        Self { kind, messages }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::new(FailureKind::BusinessRule, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Tri-state operation outcome
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Success carrying a value
    Value(T),
    /// Success with nothing to return
    Done,
    /// Expected failure; never carries a value
    Failed(Failure),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Self::Value(value)
    }

    pub fn done() -> Self {
        Self::Done
    }

    pub fn fail(failure: Failure) -> Self {
        Self::Failed(failure)
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Messages of a failed outcome; empty on success
    pub fn errors(&self) -> &[String] {
        self.as_failure().map(Failure::messages).unwrap_or(&[])
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}
