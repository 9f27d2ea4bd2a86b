//! Domain layer - user aggregate, validation rules, ports and the outcome protocol

pub mod entity;
pub mod error;
pub mod outcome;
pub mod user;

pub use entity::{Entity, EntityMeta};
pub use error::DomainError;
pub use outcome::{Failure, FailureKind, Outcome};
pub use user::{
    AccountType, Profile, User, UserFilter, UserId, UserRepository, UserValidationError,
    VerificationMethod, VerificationStatus,
};
