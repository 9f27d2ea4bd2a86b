//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserFilter, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Store {
    users: HashMap<UserId, User>,
    /// Index for normalized email -> user ID lookup
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository.
///
/// Both maps sit behind one lock so a write replaces the whole aggregate and
/// its index entry atomically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let mut store = Store::default();

        for user in users {
            store.email_index.insert(user.email().to_string(), user.id());
            store.users.insert(user.id(), user);
        }

        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.store.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId, with_details: bool) -> Result<Option<User>, DomainError> {
        let store = self.store.read().await;

        Ok(store.users.get(id).cloned().map(|user| {
            if with_details {
                user
            } else {
                user.into_root()
            }
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let store = self.store.read().await;

        Ok(store
            .email_index
            .get(email)
            .and_then(|id| store.users.get(id))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.store.read().await.email_index.contains_key(email))
    }

    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let store = self.store.read().await;

        let mut users: Vec<User> = store
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();

        users.sort_by_key(|u| u.created_at());

        Ok(users)
    }

    async fn add(&self, user: &User) -> Result<(), DomainError> {
        let mut store = self.store.write().await;

        if store.users.contains_key(&user.id()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }

        if store.email_index.contains_key(user.email()) {
            return Err(DomainError::conflict(format!(
                "Email '{}' already exists",
                user.email()
            )));
        }

        store.email_index.insert(user.email().to_string(), user.id());
        store.users.insert(user.id(), user.clone());

        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let mut store = self.store.write().await;

        let old_email = match store.users.get(&user.id()) {
            Some(existing) => existing.email().to_string(),
            None => {
                return Err(DomainError::not_found(format!(
                    "User '{}' not found",
                    user.id()
                )));
            }
        };

        // If email changed, check uniqueness and update index
        if old_email != user.email() {
            if store.email_index.contains_key(user.email()) {
                return Err(DomainError::conflict(format!(
                    "Email '{}' already exists",
                    user.email()
                )));
            }

            store.email_index.remove(&old_email);
            store.email_index.insert(user.email().to_string(), user.id());
        }

        store.users.insert(user.id(), user.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{AccountType, Profile, VerificationStatus};

    fn create_test_user(email: &str) -> User {
        let mut user = User::new(email, "hashed_password", "Test", "User", AccountType::Buyer).unwrap();
        user.set_profile(Profile::new(Some("bio".to_string()), None, None));
        user.set_verification_status(VerificationStatus::unverified());
        user
    }

    #[tokio::test]
    async fn test_add_and_find_with_details() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("test@example.com");

        repo.add(&user).await.unwrap();

        let found = repo.find_by_id(&user.id(), true).await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(found.profile().and_then(Profile::bio), Some("bio"));
        assert!(found.verification().is_some());
    }

    #[tokio::test]
    async fn test_find_without_details_returns_root_only() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("test@example.com");

        repo.add(&user).await.unwrap();

        let found = repo.find_by_id(&user.id(), false).await.unwrap().unwrap();
        assert_eq!(found.email(), "test@example.com");
        assert!(found.profile().is_none());
        assert!(found.verification().is_none());
    }

    #[test]
    fn test_with_users_builds_email_index() {
        let user = create_test_user("seeded@example.com");
        let repo = InMemoryUserRepository::with_users(vec![user.clone()]);

        let found = tokio_test::block_on(repo.find_by_email("seeded@example.com")).unwrap();
        assert_eq!(found, Some(user));
        assert_eq!(tokio_test::block_on(repo.len()), 1);
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let repo = InMemoryUserRepository::new();

        let found = repo.find_by_id(&UserId::generate(), true).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_and_exists() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("test@example.com");

        repo.add(&user).await.unwrap();

        assert!(repo.exists_by_email("test@example.com").await.unwrap());
        assert!(!repo.exists_by_email("other@example.com").await.unwrap());

        let found = repo.find_by_email("test@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id()), Some(user.id()));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();

        repo.add(&create_test_user("same@example.com")).await.unwrap();

        let result = repo.add(&create_test_user("same@example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_reindexes_email() {
        let repo = InMemoryUserRepository::new();
        let mut user = create_test_user("old@example.com");

        repo.add(&user).await.unwrap();

        user.update_email("new@example.com").unwrap();
        repo.update(&user).await.unwrap();

        assert!(!repo.exists_by_email("old@example.com").await.unwrap());
        assert!(repo.exists_by_email("new@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let repo = InMemoryUserRepository::new();
        let first = create_test_user("first@example.com");
        let mut second = create_test_user("second@example.com");

        repo.add(&first).await.unwrap();
        repo.add(&second).await.unwrap();

        second.update_email("first@example.com").unwrap();

        let result = repo.update(&second).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.update(&create_test_user("ghost@example.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_all_applies_filter() {
        let mut high = create_test_user("high@example.com");
        high.adjust_reputation(40.0).unwrap();
        let low = create_test_user("low@example.com");

        let repo = InMemoryUserRepository::with_users(vec![high.clone(), low]);

        let all = repo.find_all(&UserFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = repo
            .find_all(&UserFilter::new().with_min_reputation(80.0))
            .await
            .unwrap();
        assert_eq!(filtered, vec![high]);

        let none = repo
            .find_all(&UserFilter::new().with_verified(true))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
