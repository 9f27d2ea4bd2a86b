//! Marketplace Accounts
//!
//! User accounts for a two-sided marketplace:
//! - Registration with password hashing and duplicate-email protection
//! - Partial profile updates merged field by field
//! - Verification and reputation tracking
//! - In-memory or PostgreSQL persistence

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use config::StorageBackend;
use domain::UserRepository;
use infrastructure::user::{
    Argon2Hasher, InMemoryUserRepository, PostgresUserRepository, UserService,
};
use tracing::info;

/// User service with the repository chosen at runtime
pub type AppUserService = UserService<dyn UserRepository, Argon2Hasher>;

/// Create the user service from configuration
pub async fn create_user_service(config: &AppConfig) -> anyhow::Result<AppUserService> {
    let hasher = Arc::new(Argon2Hasher::from_config(&config.security)?);
    let repository = create_user_repository(config).await?;

    Ok(UserService::new(repository, hasher))
}

async fn create_user_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn UserRepository>> {
    info!("Storage backend: {:?}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryUserRepository::new())),
        StorageBackend::Postgres => {
            let database_url = config.storage.resolve_database_url().ok_or_else(|| {
                anyhow::anyhow!("storage.database_url or DATABASE_URL is required for PostgreSQL")
            })?;

            info!("Connecting to PostgreSQL...");
            let repository =
                PostgresUserRepository::connect(&database_url, config.storage.max_connections)
                    .await?;
            repository.ensure_schema().await?;
            info!("PostgreSQL connection established");

            Ok(Arc::new(repository))
        }
    }
}
