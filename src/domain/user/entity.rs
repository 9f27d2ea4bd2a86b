//! User aggregate root and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::Profile;
use super::validation::{normalize_email, UserValidationError};
use super::verification::{VerificationMethod, VerificationStatus};
use crate::domain::entity::{Entity, EntityMeta};

/// Lowest reputation a user can have
pub const MIN_REPUTATION: f64 = 0.0;
/// Highest reputation a user can have
pub const MAX_REPUTATION: f64 = 100.0;
/// Reputation of a newly registered user
pub const DEFAULT_REPUTATION: f64 = 50.0;

/// User identifier. The nil UUID means "not yet assigned".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidUserId(s.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the marketplace a user trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Buyer,
    Seller,
    Both,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "Buyer",
            Self::Seller => "Seller",
            Self::Both => "Both",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "both" => Ok(Self::Both),
            _ => Err(UserValidationError::UnknownAccountType(s.to_string())),
        }
    }
}

/// Stored form of a user, used by persistence adapters to rebuild the aggregate
#[derive(Debug, Clone)]
pub struct UserState {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountType,
    pub reputation_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: Option<Profile>,
    pub verification: Option<VerificationStatus>,
}

/// User aggregate root.
///
/// Owns an optional [`Profile`] and an optional [`VerificationStatus`]; both are
/// changed only through the methods below. Every mutator stamps `updated_at`.
#[derive(Debug, Clone)]
pub struct User {
    meta: EntityMeta<UserId>,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    account_type: AccountType,
    reputation_score: f64,
    profile: Option<Profile>,
    verification: Option<VerificationStatus>,
}

impl User {
    /// Create a new user with a freshly generated id.
    ///
    /// The email is trimmed and lower-cased; names are trimmed. Empty email,
    /// password hash or names are rejected.
    pub fn new(
        email: &str,
        password_hash: impl Into<String>,
        first_name: &str,
        last_name: &str,
        account_type: AccountType,
    ) -> Result<Self, UserValidationError> {
        let email = require_email(email)?;
        let password_hash = require_password_hash(password_hash.into())?;
        let (first_name, last_name) = require_names(first_name, last_name)?;

        Ok(Self {
            meta: EntityMeta::new(UserId::generate()),
            email,
            password_hash,
            first_name,
            last_name,
            account_type,
            reputation_score: DEFAULT_REPUTATION,
            profile: None,
            verification: None,
        })
    }

    /// Rebuild a user from its stored form, re-checking every invariant
    pub fn restore(state: UserState) -> Result<Self, UserValidationError> {
        if state.id.is_nil() {
            return Err(UserValidationError::InvalidUserId(state.id.to_string()));
        }

        if !(MIN_REPUTATION..=MAX_REPUTATION).contains(&state.reputation_score) {
            return Err(UserValidationError::ReputationOutOfRange(
                state.reputation_score,
            ));
        }

        let email = require_email(&state.email)?;
        let password_hash = require_password_hash(state.password_hash)?;
        let (first_name, last_name) = require_names(&state.first_name, &state.last_name)?;

        Ok(Self {
            meta: EntityMeta::restore(state.id, state.created_at, state.updated_at),
            email,
            password_hash,
            first_name,
            last_name,
            account_type: state.account_type,
            reputation_score: state.reputation_score,
            profile: state.profile,
            verification: state.verification,
        })
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.meta.id()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn reputation_score(&self) -> f64 {
        self.reputation_score
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn verification(&self) -> Option<&VerificationStatus> {
        self.verification.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.verification
            .as_ref()
            .is_some_and(VerificationStatus::is_verified)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at()
    }

    /// The root alone, as returned by a lookup that skips owned parts
    pub fn into_root(mut self) -> Self {
        self.profile = None;
        self.verification = None;
        self
    }

    // Mutators

    pub fn update_name(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), UserValidationError> {
        let (first_name, last_name) = require_names(first_name, last_name)?;

        self.first_name = first_name;
        self.last_name = last_name;
        self.touch();

        Ok(())
    }

    pub fn update_email(&mut self, email: &str) -> Result<(), UserValidationError> {
        self.email = require_email(email)?;
        self.touch();

        Ok(())
    }

    pub fn update_password_hash(
        &mut self,
        password_hash: impl Into<String>,
    ) -> Result<(), UserValidationError> {
        self.password_hash = require_password_hash(password_hash.into())?;
        self.touch();

        Ok(())
    }

    /// Apply a signed delta, clamping the score to `[0, 100]`. Returns the new score.
    pub fn adjust_reputation(&mut self, points: f64) -> Result<f64, UserValidationError> {
        if !points.is_finite() {
            return Err(UserValidationError::NonFiniteReputationDelta);
        }

        self.reputation_score =
            (self.reputation_score + points).clamp(MIN_REPUTATION, MAX_REPUTATION);
        self.touch();

        Ok(self.reputation_score)
    }

    /// Attach a profile
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = Some(profile);
        self.touch();
    }

    /// Attach a verification status
    pub fn set_verification_status(&mut self, status: VerificationStatus) {
        self.verification = Some(status);
        self.touch();
    }

    /// Return the profile, creating an empty one first if the user has none
    pub fn ensure_profile(&mut self) -> &Profile {
        if self.profile.is_none() {
            self.set_profile(Profile::empty());
        }

        self.profile.get_or_insert_with(Profile::empty)
    }

    /// Replace the profile fields with an already merged triple
    pub fn update_profile(
        &mut self,
        bio: Option<String>,
        location: Option<String>,
        avatar_url: Option<String>,
    ) {
        self.profile
            .get_or_insert_with(Profile::empty)
            .update(bio, location, avatar_url);
        self.touch();
    }

    /// Mark the user verified, creating a verification status if missing
    pub fn verify(
        &mut self,
        method: VerificationMethod,
        notes: Option<String>,
    ) -> Result<(), UserValidationError> {
        self.verification
            .get_or_insert_with(VerificationStatus::unverified)
            .verify(method, notes)?;
        self.touch();

        Ok(())
    }

    /// Revoke verification, keeping the reason in the notes.
    /// Returns false when the user was not verified.
    pub fn revoke_verification(&mut self, reason: &str) -> bool {
        match self.verification.as_mut() {
            Some(status) if status.is_verified() => {
                status.revoke(reason);
                self.touch();
                true
            }
            _ => false,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn meta(&self) -> &EntityMeta<UserId> {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta<UserId> {
        &mut self.meta
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other)
    }
}

fn require_email(email: &str) -> Result<String, UserValidationError> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    Ok(email)
}

fn require_password_hash(password_hash: String) -> Result<String, UserValidationError> {
    if password_hash.trim().is_empty() {
        return Err(UserValidationError::EmptyPasswordHash);
    }

    Ok(password_hash)
}

fn require_names(
    first_name: &str,
    last_name: &str,
) -> Result<(String, String), UserValidationError> {
    let first_name = first_name.trim();
    let last_name = last_name.trim();

    if first_name.is_empty() {
        return Err(UserValidationError::EmptyFirstName);
    }

    if last_name.is_empty() {
        return Err(UserValidationError::EmptyLastName);
    }

    Ok((first_name.to_string(), last_name.to_string()))
}
