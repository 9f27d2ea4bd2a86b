//! Read models returned by the user service
//!
//! The password hash never leaves the aggregate. A summary carries the root
//! fields only; a detail adds the owned profile and verification status.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::user::{Profile, User, UserId, VerificationStatus};

/// Root fields of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub account_type: String,
    pub reputation_score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            full_name: user.full_name(),
            account_type: user.account_type().to_string(),
            reputation_score: user.reputation_score(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            bio: profile.bio().map(str::to_string),
            avatar_url: profile.avatar_url().map(str::to_string),
            location: profile.location().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationView {
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub method: String,
    pub notes: Option<String>,
}

impl From<&VerificationStatus> for VerificationView {
    fn from(status: &VerificationStatus) -> Self {
        Self {
            is_verified: status.is_verified(),
            verified_at: status.verified_at(),
            method: status.method().to_string(),
            notes: status.notes().map(str::to_string),
        }
    }
}

/// Summary plus the owned parts of the aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub updated_at: DateTime<Utc>,
    pub is_verified: bool,
    pub profile: Option<ProfileView>,
    pub verification: Option<VerificationView>,
}

impl From<&User> for UserDetail {
    fn from(user: &User) -> Self {
        Self {
            summary: UserSummary::from(user),
            updated_at: user.updated_at(),
            is_verified: user.is_verified(),
            profile: user.profile().map(ProfileView::from),
            verification: user.verification().map(VerificationView::from),
        }
    }
}

/// Either projection, picked by the caller's `include_details` flag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserView {
    Summary(UserSummary),
    Detail(UserDetail),
}

impl UserView {
    pub fn project(user: &User, include_details: bool) -> Self {
        if include_details {
            UserView::Detail(UserDetail::from(user))
        } else {
            UserView::Summary(UserSummary::from(user))
        }
    }
}
