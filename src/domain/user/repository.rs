//! User repository trait

use async_trait::async_trait;
use serde::Deserialize;

#[cfg(test)]
use mockall::automock;

use super::entity::{AccountType, User, UserId};
use crate::domain::DomainError;

/// Conjunction of optional predicates used to list users.
/// An absent predicate lets every user through.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserFilter {
    pub account_type: Option<AccountType>,
    pub is_verified: Option<bool>,
    /// Inclusive lower bound
    pub min_reputation_score: Option<f64>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.is_verified = Some(verified);
        self
    }

    pub fn with_min_reputation(mut self, score: f64) -> Self {
        self.min_reputation_score = Some(score);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.account_type.is_none() && self.is_verified.is_none() && self.min_reputation_score.is_none()
    }

    /// Check a user against every provided predicate
    pub fn matches(&self, user: &User) -> bool {
        self.account_type.is_none_or(|t| user.account_type() == t)
            && self.is_verified.is_none_or(|v| user.is_verified() == v)
            && self
                .min_reputation_score
                .is_none_or(|min| user.reputation_score() >= min)
    }
}

/// Persistence port for the user aggregate.
///
/// `add` and `update` store the root together with its profile and
/// verification status as one unit.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id. With `with_details` the profile and verification
    /// status are loaded in the same fetch; without it only the root is returned.
    async fn find_by_id(&self, id: &UserId, with_details: bool) -> Result<Option<User>, DomainError>;

    /// Find a user by normalized email, with details
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Check whether a normalized email is already registered
    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError>;

    /// List users matching the filter, with details
    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError>;

    /// Persist a new user
    async fn add(&self, user: &User) -> Result<(), DomainError>;

    /// Persist changes to an existing user
    async fn update(&self, user: &User) -> Result<(), DomainError>;
}
