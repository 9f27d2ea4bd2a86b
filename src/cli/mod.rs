//! CLI module for Marketplace Accounts
//!
//! Each subcommand builds the user service from configuration, runs one
//! operation and prints the outcome as JSON.

pub mod runner;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AccountType, UserId, VerificationMethod};

pub use runner::run;

/// Marketplace Accounts - user registration, profiles, verification and reputation
#[derive(Parser)]
#[command(name = "marketplace-accounts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new user
    Register(RegisterArgs),

    /// Update names and profile fields of a user
    Update(UpdateArgs),

    /// Show one user by ID
    Get(GetArgs),

    /// Show one user by email
    Find(FindArgs),

    /// List users matching optional filters
    List(ListArgs),

    /// Mark a user as verified
    Verify(VerifyArgs),

    /// Revoke a user's verification
    Revoke(RevokeArgs),

    /// Apply a signed reputation adjustment
    Reputation(ReputationArgs),

    /// Change a user's password
    Password(PasswordArgs),
}

#[derive(Args, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Defaults to the password
    #[arg(long)]
    pub confirm_password: Option<String>,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Buyer, Seller or Both
    #[arg(long, default_value = "Buyer")]
    pub account_type: AccountType,
}

#[derive(Args, Clone)]
pub struct UpdateArgs {
    pub id: UserId,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long, conflicts_with = "clear_bio")]
    pub bio: Option<String>,

    #[arg(long, conflicts_with = "clear_location")]
    pub location: Option<String>,

    #[arg(long, conflicts_with = "clear_avatar_url")]
    pub avatar_url: Option<String>,

    #[arg(long)]
    pub clear_bio: bool,

    #[arg(long)]
    pub clear_location: bool,

    #[arg(long)]
    pub clear_avatar_url: bool,
}

#[derive(Args, Clone)]
pub struct GetArgs {
    pub id: UserId,

    /// Include profile and verification status
    #[arg(long)]
    pub details: bool,
}

#[derive(Args, Clone)]
pub struct FindArgs {
    pub email: String,
}

#[derive(Args, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub account_type: Option<AccountType>,

    #[arg(long)]
    pub verified: Option<bool>,

    /// Inclusive lower bound
    #[arg(long)]
    pub min_reputation: Option<f64>,
}

#[derive(Args, Clone)]
pub struct VerifyArgs {
    pub id: UserId,

    /// Email, Phone, Document or Manual
    #[arg(long)]
    pub method: VerificationMethod,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Clone)]
pub struct RevokeArgs {
    pub id: UserId,

    #[arg(long)]
    pub reason: String,
}

#[derive(Args, Clone)]
pub struct ReputationArgs {
    pub id: UserId,

    /// Signed delta, e.g. 5 or -12.5
    #[arg(long, allow_hyphen_values = true)]
    pub points: f64,
}

#[derive(Args, Clone)]
pub struct PasswordArgs {
    pub id: UserId,

    #[arg(long)]
    pub current_password: String,

    #[arg(long)]
    pub new_password: String,

    /// Defaults to the new password
    #[arg(long)]
    pub confirm_password: Option<String>,
}
