//! User infrastructure module
//!
//! Password hashing with Argon2, in-memory and PostgreSQL repositories, the
//! request shapes and read models, and the user service orchestrating them.

mod password;
mod postgres_repository;
mod projection;
mod repository;
mod requests;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use projection::{ProfileView, UserDetail, UserSummary, UserView, VerificationView};
pub use repository::InMemoryUserRepository;
pub use requests::{
    AdjustReputationRequest, ChangePasswordRequest, RegisterUserRequest,
    RevokeVerificationRequest, UpdateUserRequest, VerifyUserRequest,
};
pub use service::UserService;
