//! PostgreSQL user repository implementation
//!
//! The aggregate spans three tables keyed by the owner id: `users`,
//! `user_profiles` and `user_verifications`. Writes touch all three inside one
//! transaction; a transaction dropped before commit rolls back.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::domain::user::{
    AccountType, Profile, User, UserFilter, UserId, UserRepository, UserState,
    VerificationMethod, VerificationStatus,
};
use crate::domain::DomainError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    account_type TEXT NOT NULL,
    reputation_score DOUBLE PRECISION NOT NULL DEFAULT 50
        CHECK (reputation_score >= 0 AND reputation_score <= 100),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profiles (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    bio TEXT,
    avatar_url TEXT,
    location TEXT
);

CREATE TABLE IF NOT EXISTS user_verifications (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    verified_at TIMESTAMPTZ,
    method TEXT NOT NULL DEFAULT 'None',
    notes TEXT,
    CHECK (NOT is_verified OR (verified_at IS NOT NULL AND method <> 'None'))
);
"#;

const USER_COLUMNS: &str = "u.id, u.email, u.password_hash, u.first_name, u.last_name, \
     u.account_type, u.reputation_score, u.created_at, u.updated_at";

const DETAIL_COLUMNS: &str = "p.user_id AS profile_user_id, p.bio, p.avatar_url, p.location, \
     v.user_id AS verification_user_id, v.is_verified, v.verified_at, v.method, v.notes";

const DETAIL_JOINS: &str = "LEFT JOIN user_profiles p ON p.user_id = u.id \
     LEFT JOIN user_verifications v ON v.user_id = u.id";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and build a repository
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Create tables if they don't exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create user tables: {}", e)))?;

        info!("User schema ready");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId, with_details: bool) -> Result<Option<User>, DomainError> {
        let sql = if with_details {
            format!(
                "SELECT {}, {} FROM users u {} WHERE u.id = $1",
                USER_COLUMNS, DETAIL_COLUMNS, DETAIL_JOINS
            )
        } else {
            format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS)
        };

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.map(|row| row_to_user(&row, with_details)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "SELECT {}, {} FROM users u {} WHERE u.email = $1",
            USER_COLUMNS, DETAIL_COLUMNS, DETAIL_JOINS
        );

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        row.map(|row| row_to_user(&row, true)).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check email: {}", e)))
    }

    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let mut query = find_all_query(filter);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        rows.iter().map(|row| row_to_user(row, true)).collect()
    }

    async fn add(&self, user: &User) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name,
                               account_type, reputation_score, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.account_type().as_str())
        .bind(user.reputation_score())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, user, "create"))?;

        write_owned_parts(&mut tx, user).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit user: {}", e)))
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                account_type = $6, reputation_score = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.account_type().as_str())
        .bind(user.reputation_score())
        .bind(user.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, user, "update"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        // Owned parts absent from a root-only load are left untouched
        write_owned_parts(&mut tx, user).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit user: {}", e)))
    }
}

async fn write_owned_parts(
    tx: &mut Transaction<'static, Postgres>,
    user: &User,
) -> Result<(), DomainError> {
    if let Some(profile) = user.profile() {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, bio, avatar_url, location)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET bio = EXCLUDED.bio, avatar_url = EXCLUDED.avatar_url, location = EXCLUDED.location
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(profile.bio())
        .bind(profile.avatar_url())
        .bind(profile.location())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to write profile: {}", e)))?;
    }

    if let Some(status) = user.verification() {
        sqlx::query(
            r#"
            INSERT INTO user_verifications (user_id, is_verified, verified_at, method, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET is_verified = EXCLUDED.is_verified, verified_at = EXCLUDED.verified_at,
                method = EXCLUDED.method, notes = EXCLUDED.notes
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(status.is_verified())
        .bind(status.verified_at())
        .bind(status.method().as_str())
        .bind(status.notes())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to write verification: {}", e)))?;
    }

    Ok(())
}

/// Compose the listing query; every provided predicate adds one AND clause
fn find_all_query(filter: &UserFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {}, {} FROM users u {} WHERE TRUE",
        USER_COLUMNS, DETAIL_COLUMNS, DETAIL_JOINS
    ));

    if let Some(account_type) = filter.account_type {
        query
            .push(" AND u.account_type = ")
            .push_bind(account_type.as_str());
    }

    if let Some(verified) = filter.is_verified {
        query
            .push(" AND COALESCE(v.is_verified, FALSE) = ")
            .push_bind(verified);
    }

    if let Some(min_score) = filter.min_reputation_score {
        query
            .push(" AND u.reputation_score >= ")
            .push_bind(min_score);
    }

    query.push(" ORDER BY u.created_at");
    query
}

fn map_write_error(error: sqlx::Error, user: &User, action: &str) -> DomainError {
    let msg = error.to_string();

    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        if msg.contains("email") {
            DomainError::conflict(format!("Email '{}' already exists", user.email()))
        } else {
            DomainError::conflict(format!("User with ID '{}' already exists", user.id()))
        }
    } else {
        DomainError::storage(format!("Failed to {} user: {}", action, error))
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
}

fn row_to_user(row: &PgRow, with_details: bool) -> Result<User, DomainError> {
    let account_type: String = column(row, "account_type")?;
    let account_type = account_type
        .parse::<AccountType>()
        .map_err(|e| DomainError::internal(format!("Invalid user in database: {}", e)))?;

    let (profile, verification) = if with_details {
        (row_to_profile(row)?, row_to_verification(row)?)
    } else {
        (None, None)
    };

    let id: Uuid = column(row, "id")?;

    User::restore(UserState {
        id: UserId::from_uuid(id),
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        account_type,
        reputation_score: column(row, "reputation_score")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
        profile,
        verification,
    })
    .map_err(|e| DomainError::internal(format!("Invalid user in database: {}", e)))
}

fn row_to_profile(row: &PgRow) -> Result<Option<Profile>, DomainError> {
    let owner: Option<Uuid> = column(row, "profile_user_id")?;

    if owner.is_none() {
        return Ok(None);
    }

    Ok(Some(Profile::new(
        column(row, "bio")?,
        column(row, "avatar_url")?,
        column(row, "location")?,
    )))
}

fn row_to_verification(row: &PgRow) -> Result<Option<VerificationStatus>, DomainError> {
    let owner: Option<Uuid> = column(row, "verification_user_id")?;

    if owner.is_none() {
        return Ok(None);
    }

    let method: String = column(row, "method")?;
    let method = method
        .parse::<VerificationMethod>()
        .map_err(|e| DomainError::internal(format!("Invalid verification in database: {}", e)))?;

    VerificationStatus::restore(
        column(row, "is_verified")?,
        column(row, "verified_at")?,
        method,
        column(row, "notes")?,
    )
    .map(Some)
    .map_err(|e| DomainError::internal(format!("Invalid verification in database: {}", e)))
}
