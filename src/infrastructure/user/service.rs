//! User service orchestrating registration, updates and lookups
//!
//! Every operation returns `Result<Outcome<T>, DomainError>`. Expected failures
//! (validation, business rule, not found) come back as `Ok(Outcome::Failed)`;
//! storage and hashing errors propagate as `Err`.

use std::sync::Arc;

use tracing::{debug, info};
use validator::Validate;

use crate::domain::user::{
    failure_from_errors, normalize_email, Profile, User, UserFilter, UserId, UserRepository,
    VerificationStatus,
};
use crate::domain::{DomainError, Failure, Outcome};

use super::password::PasswordHasher;
use super::projection::{UserSummary, UserView};
use super::requests::{
    AdjustReputationRequest, ChangePasswordRequest, RegisterUserRequest,
    RevokeVerificationRequest, UpdateUserRequest, VerifyUserRequest,
};

/// User service for registration and account management
pub struct UserService<R: UserRepository + ?Sized, H: PasswordHasher + ?Sized> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository + ?Sized, H: PasswordHasher + ?Sized + 'static> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Argon2 is CPU-bound, so it runs on the blocking pool
    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, DomainError> {
        let hasher = Arc::clone(&self.hasher);

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("Password verification task failed: {}", e)))
    }

    /// Register a new user.
    ///
    /// Steps run in order: format validation, duplicate-email check, password
    /// hashing, aggregate construction with an empty profile and an unverified
    /// status, then one write of the whole aggregate.
    pub async fn register(
        &self,
        request: RegisterUserRequest,
    ) -> Result<Outcome<UserSummary>, DomainError> {
        let request = request.trimmed();

        if let Err(errors) = request.validate() {
            return Ok(reject("register", failure_from_errors(&errors)));
        }

        let email = normalize_email(&request.email);
        debug!(email = %email, "Registering user");

        if self.repository.exists_by_email(&email).await? {
            return Ok(reject(
                "register",
                Failure::business_rule(format!("A user with email '{}' already exists", email)),
            ));
        }

        let password_hash = self.hash_password(request.password.clone()).await?;

        let mut user = match User::new(
            &email,
            password_hash,
            &request.first_name,
            &request.last_name,
            request.account_type,
        ) {
            Ok(user) => user,
            Err(e) => return Ok(reject("register", e.into())),
        };

        user.set_profile(Profile::empty());
        user.set_verification_status(VerificationStatus::unverified());

        if let Err(error) = self.repository.add(&user).await {
            return Ok(reject("register", expected_failure(error)?));
        }

        info!(
            user_id = %user.id(),
            account_type = %user.account_type(),
            "User registered"
        );

        Ok(Outcome::success(UserSummary::from(&user)))
    }

    /// Apply a partial update, merging every supplied field independently
    pub async fn update(
        &self,
        request: UpdateUserRequest,
    ) -> Result<Outcome<UserSummary>, DomainError> {
        let request = request.trimmed();

        if let Err(errors) = request.validate() {
            return Ok(reject("update", failure_from_errors(&errors)));
        }

        let changes_names = request.has_name_changes();
        let changes_profile = request.has_profile_changes();

        let Some(mut user) = self.repository.find_by_id(&request.user_id, true).await? else {
            return Ok(reject("update", user_not_found(&request.user_id)));
        };

        if changes_names {
            let first_name = request
                .first_name
                .unwrap_or_else(|| user.first_name().to_string());
            let last_name = request
                .last_name
                .unwrap_or_else(|| user.last_name().to_string());

            if let Err(e) = user.update_name(&first_name, &last_name) {
                return Ok(reject("update", e.into()));
            }
        }

        if changes_profile {
            let current = user.ensure_profile().clone();

            user.update_profile(
                merge_field(request.bio, current.bio()),
                merge_field(request.location, current.location()),
                merge_field(request.avatar_url, current.avatar_url()),
            );
        }

        if let Err(error) = self.repository.update(&user).await {
            return Ok(reject("update", expected_failure(error)?));
        }

        info!(
            user_id = %user.id(),
            names = changes_names,
            profile = changes_profile,
            "User updated"
        );

        Ok(Outcome::success(UserSummary::from(&user)))
    }

    /// Look up one user, projecting to the detail shape only when asked
    pub async fn get_by_id(
        &self,
        id: UserId,
        include_details: bool,
    ) -> Result<Outcome<UserView>, DomainError> {
        if id.is_nil() {
            return Ok(reject("get_by_id", Failure::validation("User ID is required")));
        }

        let Some(user) = self.repository.find_by_id(&id, include_details).await? else {
            return Ok(reject("get_by_id", user_not_found(&id)));
        };

        Ok(Outcome::success(UserView::project(&user, include_details)))
    }

    /// Look up one user by email, compared after normalization
    pub async fn get_by_email(&self, email: &str) -> Result<Outcome<UserSummary>, DomainError> {
        let email = normalize_email(email);

        if email.is_empty() {
            return Ok(reject("get_by_email", Failure::validation("Email is required")));
        }

        match self.repository.find_by_email(&email).await? {
            Some(user) => Ok(Outcome::success(UserSummary::from(&user))),
            None => Ok(reject(
                "get_by_email",
                Failure::not_found(format!("User with email '{}' was not found", email)),
            )),
        }
    }

    /// List users matching every predicate of the filter. No match is an empty list.
    ///
    /// Any numeric threshold is a plain filter, even one outside `[0, 100]`.
    pub async fn get_all(
        &self,
        filter: &UserFilter,
    ) -> Result<Outcome<Vec<UserSummary>>, DomainError> {
        if filter.min_reputation_score.is_some_and(f64::is_nan) {
            return Ok(reject(
                "get_all",
                Failure::validation("Minimum reputation score must be a number"),
            ));
        }

        let users = self.repository.find_all(filter).await?;
        debug!(count = users.len(), "Listed users");

        Ok(Outcome::success(
            users.iter().map(UserSummary::from).collect(),
        ))
    }

    /// Mark a user as verified through the given method
    pub async fn verify_user(
        &self,
        request: VerifyUserRequest,
    ) -> Result<Outcome<UserSummary>, DomainError> {
        if let Err(errors) = request.validate() {
            return Ok(reject("verify_user", failure_from_errors(&errors)));
        }

        let Some(mut user) = self.repository.find_by_id(&request.user_id, true).await? else {
            return Ok(reject("verify_user", user_not_found(&request.user_id)));
        };

        if let Err(e) = user.verify(request.method, request.notes) {
            return Ok(reject("verify_user", e.into()));
        }

        if let Err(error) = self.repository.update(&user).await {
            return Ok(reject("verify_user", expected_failure(error)?));
        }

        info!(user_id = %user.id(), method = %request.method, "User verified");

        Ok(Outcome::success(UserSummary::from(&user)))
    }

    /// Revoke a user's verification, recording the reason in the notes
    pub async fn revoke_verification(
        &self,
        request: RevokeVerificationRequest,
    ) -> Result<Outcome<()>, DomainError> {
        if let Err(errors) = request.validate() {
            return Ok(reject("revoke_verification", failure_from_errors(&errors)));
        }

        let Some(mut user) = self.repository.find_by_id(&request.user_id, true).await? else {
            return Ok(reject("revoke_verification", user_not_found(&request.user_id)));
        };

        if !user.revoke_verification(request.reason.trim()) {
            return Ok(reject(
                "revoke_verification",
                Failure::business_rule(format!("User '{}' is not verified", user.id())),
            ));
        }

        if let Err(error) = self.repository.update(&user).await {
            return Ok(reject("revoke_verification", expected_failure(error)?));
        }

        info!(user_id = %user.id(), "User verification revoked");

        Ok(Outcome::done())
    }

    /// Apply a signed reputation delta; the score is clamped to `[0, 100]`
    pub async fn adjust_reputation(
        &self,
        request: AdjustReputationRequest,
    ) -> Result<Outcome<UserSummary>, DomainError> {
        if let Err(errors) = request.validate() {
            return Ok(reject("adjust_reputation", failure_from_errors(&errors)));
        }

        let Some(mut user) = self.repository.find_by_id(&request.user_id, true).await? else {
            return Ok(reject("adjust_reputation", user_not_found(&request.user_id)));
        };

        let score = match user.adjust_reputation(request.points) {
            Ok(score) => score,
            Err(e) => return Ok(reject("adjust_reputation", e.into())),
        };

        if let Err(error) = self.repository.update(&user).await {
            return Ok(reject("adjust_reputation", expected_failure(error)?));
        }

        info!(
            user_id = %user.id(),
            points = request.points,
            score,
            "User reputation adjusted"
        );

        Ok(Outcome::success(UserSummary::from(&user)))
    }

    /// Replace a user's password after checking the current one
    pub async fn change_password(
        &self,
        request: ChangePasswordRequest,
    ) -> Result<Outcome<()>, DomainError> {
        if let Err(errors) = request.validate() {
            return Ok(reject("change_password", failure_from_errors(&errors)));
        }

        let Some(mut user) = self.repository.find_by_id(&request.user_id, true).await? else {
            return Ok(reject("change_password", user_not_found(&request.user_id)));
        };

        let current_matches = self
            .verify_password(
                request.current_password.clone(),
                user.password_hash().to_string(),
            )
            .await?;

        if !current_matches {
            return Ok(reject(
                "change_password",
                Failure::business_rule("Current password is incorrect"),
            ));
        }

        let password_hash = self.hash_password(request.new_password.clone()).await?;

        if let Err(e) = user.update_password_hash(password_hash) {
            return Ok(reject("change_password", e.into()));
        }

        if let Err(error) = self.repository.update(&user).await {
            return Ok(reject("change_password", expected_failure(error)?));
        }

        info!(user_id = %user.id(), "User password changed");

        Ok(Outcome::done())
    }
}

/// Present value wins, including an explicit clear; absent keeps the stored value
fn merge_field(update: Option<Option<String>>, current: Option<&str>) -> Option<String> {
    match update {
        Some(value) => value,
        None => current.map(str::to_string),
    }
}

fn user_not_found(id: &UserId) -> Failure {
    Failure::not_found(format!("User with ID '{}' was not found", id))
}

// A write can still lose a race against a concurrent registration or delete.
fn expected_failure(error: DomainError) -> Result<Failure, DomainError> {
    match error {
        DomainError::Conflict { message } => Ok(Failure::business_rule(message)),
        DomainError::NotFound { message } => Ok(Failure::not_found(message)),
        other => Err(other),
    }
}

fn reject<T>(operation: &'static str, failure: Failure) -> Outcome<T> {
    debug!(
        operation,
        kind = %failure.kind(),
        errors = ?failure.messages(),
        "Request rejected"
    );
    Outcome::fail(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{AccountType, MockUserRepository, VerificationMethod};
    use crate::domain::FailureKind;
    use crate::infrastructure::user::password::{Argon2Hasher, MockPasswordHasher};
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    type TestService = UserService<InMemoryUserRepository, Argon2Hasher>;

    fn create_service() -> (TestService, Arc<InMemoryUserRepository>) {
        let repository = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap());
        (UserService::new(repository.clone(), hasher), repository)
    }

    fn register_request(email: &str) -> RegisterUserRequest {
        RegisterUserRequest::new(
            email,
            "SecurePass123!",
            "SecurePass123!",
            "John",
            "Doe",
            AccountType::Buyer,
        )
    }

    async fn register(service: &TestService, email: &str) -> UserSummary {
        service
            .register(register_request(email))
            .await
            .unwrap()
            .into_value()
            .unwrap()
    }

    async fn stored(repository: &InMemoryUserRepository, id: UserId) -> User {
        repository.find_by_id(&id, true).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_register_user() {
        let (service, repository) = create_service();

        let summary = register(&service, "  John.Doe@Example.COM ").await;
        assert_eq!(summary.email, "john.doe@example.com");
        assert_eq!(summary.full_name, "John Doe");
        assert_eq!(summary.account_type, "Buyer");
        assert_eq!(summary.reputation_score, 50.0);

        let user = stored(&repository, summary.id).await;
        assert_ne!(user.password_hash(), "SecurePass123!");
        assert!(user.profile().is_some_and(Profile::is_empty));
        assert!(user.verification().is_some());
        assert!(!user.is_verified());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_any_casing() {
        let (service, repository) = create_service();

        register(&service, "john@example.com").await;

        let outcome = service
            .register(register_request("  JOHN@Example.com  "))
            .await
            .unwrap();

        let failure = outcome.as_failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::BusinessRule);
        assert!(failure.messages()[0].contains("already exists"));
        assert!(outcome.value().is_none());
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let (service, repository) = create_service();

        let request = RegisterUserRequest::new(
            "john@example.com",
            "password",
            "password",
            "John",
            "Doe",
            AccountType::Buyer,
        );

        let outcome = service.register(request).await.unwrap();

        assert!(outcome.is_failure());
        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::Validation)
        );
        let errors = outcome.errors().join(" ");
        assert!(errors.contains("uppercase"));
        assert!(errors.contains("digit"));
        assert!(errors.contains("special"));
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_mismatched_confirmation() {
        let (service, _) = create_service();

        let request = RegisterUserRequest::new(
            "john@example.com",
            "SecurePass123!",
            "SecurePass123?",
            "John",
            "Doe",
            AccountType::Buyer,
        );

        let outcome = service.register(request).await.unwrap();
        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::Validation)
        );
    }

    #[tokio::test]
    async fn test_register_validates_before_any_io() {
        // No expectations: any repository or hasher call panics.
        let service = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockPasswordHasher::new()),
        );

        let outcome = service
            .register(register_request("not-an-email"))
            .await
            .unwrap();

        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn test_register_duplicate_skips_hashing_and_persistence() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .withf(|email| email == "john@example.com")
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_add().never();

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().never();

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let outcome = service
            .register(register_request("John@Example.com"))
            .await
            .unwrap();

        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::BusinessRule)
        );
    }

    #[tokio::test]
    async fn test_register_hashing_error_propagates() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .returning(|_| Ok(false));
        repository.expect_add().never();

        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Err(DomainError::hashing("out of memory")));

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let result = service.register(register_request("john@example.com")).await;
        assert!(matches!(result, Err(DomainError::Hashing { .. })));
    }

    #[tokio::test]
    async fn test_password_hashing_runs_off_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();

        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .returning(|_| Ok(false));
        repository.expect_add().returning(|_| Ok(()));

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().times(1).returning(move |_| {
            if std::thread::current().id() == runtime_thread {
                return Err(DomainError::hashing("hashed on the runtime thread"));
            }
            Ok("hashed".to_string())
        });

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let outcome = service
            .register(register_request("john@example.com"))
            .await
            .unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_change_password_verifies_and_hashes_off_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let user = User::new("john@example.com", "stored", "John", "Doe", AccountType::Buyer)
            .unwrap();
        let user_id = user.id();

        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(user.clone())));
        repository
            .expect_update()
            .withf(|user| user.password_hash() == "rehashed")
            .times(1)
            .returning(|_| Ok(()));

        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .times(1)
            .returning(move |_, _| std::thread::current().id() != runtime_thread);
        hasher.expect_hash().times(1).returning(move |_| {
            if std::thread::current().id() == runtime_thread {
                return Err(DomainError::hashing("hashed on the runtime thread"));
            }
            Ok("rehashed".to_string())
        });

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let outcome = service
            .change_password(ChangePasswordRequest {
                user_id,
                current_password: "SecurePass123!".to_string(),
                new_password: "NewSecure456!".to_string(),
                confirm_password: "NewSecure456!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Done);
    }

    #[tokio::test]
    async fn test_register_persists_assembled_aggregate() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .returning(|_| Ok(false));
        repository
            .expect_add()
            .withf(|user| {
                user.email() == "john@example.com"
                    && user.password_hash() == "hashed"
                    && user.profile().is_some()
                    && user.verification().is_some_and(|v| !v.is_verified())
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("hashed".to_string()));

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let outcome = service
            .register(register_request("john@example.com"))
            .await
            .unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_register_lost_race_is_business_rule() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_exists_by_email()
            .returning(|_| Ok(false));
        repository
            .expect_add()
            .returning(|_| Err(DomainError::conflict("Email 'john@example.com' already exists")));

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().returning(|_| Ok("hashed".to_string()));

        let service = UserService::new(Arc::new(repository), Arc::new(hasher));

        let outcome = service
            .register(register_request("john@example.com"))
            .await
            .unwrap();
        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::BusinessRule)
        );
    }

    #[tokio::test]
    async fn test_update_last_name_only() {
        let (service, repository) = create_service();
        let summary = register(&service, "john@example.com").await;

        let updated = service
            .update(UpdateUserRequest::new(summary.id).with_last_name("Smith"))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        assert_eq!(updated.first_name, "John");
        assert_eq!(updated.last_name, "Smith");

        let user = stored(&repository, summary.id).await;
        assert_eq!(user.first_name(), "John");
        assert_eq!(user.last_name(), "Smith");
    }

    #[tokio::test]
    async fn test_update_bio_only_keeps_other_profile_fields() {
        let (service, repository) = create_service();
        let summary = register(&service, "john@example.com").await;

        service
            .update(
                UpdateUserRequest::new(summary.id)
                    .with_bio("old")
                    .with_location("NYC"),
            )
            .await
            .unwrap()
            .into_value()
            .unwrap();

        service
            .update(UpdateUserRequest::new(summary.id).with_bio("hello"))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let user = stored(&repository, summary.id).await;
        let profile = user.profile().unwrap();
        assert_eq!(profile.bio(), Some("hello"));
        assert_eq!(profile.location(), Some("NYC"));
        assert_eq!(profile.avatar_url(), None);
        assert_eq!(user.first_name(), "John");
    }

    #[tokio::test]
    async fn test_update_clears_single_profile_field() {
        let (service, repository) = create_service();
        let summary = register(&service, "john@example.com").await;

        service
            .update(
                UpdateUserRequest::new(summary.id)
                    .with_bio("bio")
                    .with_location("NYC")
                    .with_avatar_url("https://cdn.example.com/a.png"),
            )
            .await
            .unwrap()
            .into_value()
            .unwrap();

        service
            .update(UpdateUserRequest::new(summary.id).clear_location())
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let user = stored(&repository, summary.id).await;
        let profile = user.profile().unwrap();
        assert_eq!(profile.bio(), Some("bio"));
        assert_eq!(profile.location(), None);
        assert_eq!(profile.avatar_url(), Some("https://cdn.example.com/a.png"));
    }

    #[tokio::test]
    async fn test_update_creates_missing_profile() {
        let user = User::new(
            "legacy@example.com",
            "hash",
            "Old",
            "Account",
            AccountType::Seller,
        )
        .unwrap();
        let id = user.id();
        let repository = Arc::new(InMemoryUserRepository::with_users(vec![user]));
        let service = UserService::new(
            repository.clone(),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
        );

        service
            .update(UpdateUserRequest::new(id).with_location("Porto"))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let user = stored(&repository, id).await;
        let profile = user.profile().unwrap();
        assert_eq!(profile.location(), Some("Porto"));
        assert_eq!(profile.bio(), None);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let (service, _) = create_service();

        let outcome = service
            .update(UpdateUserRequest::new(UserId::generate()).with_first_name("Jane"))
            .await
            .unwrap();

        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_update_invalid_avatar() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let outcome = service
            .update(UpdateUserRequest::new(summary.id).with_avatar_url("not a url"))
            .await
            .unwrap();

        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::Validation)
        );
    }

    #[tokio::test]
    async fn test_get_by_id_unknown_is_not_found() {
        let (service, _) = create_service();

        let outcome = service.get_by_id(UserId::generate(), true).await.unwrap();

        assert!(outcome.is_failure());
        assert!(!outcome.is_success());
        assert!(outcome.value().is_none());
        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_get_by_id_picks_projection() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let view = service
            .get_by_id(summary.id, false)
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(view, UserView::Summary(summary.clone()));

        let view = service
            .get_by_id(summary.id, true)
            .await
            .unwrap()
            .into_value()
            .unwrap();
        match view {
            UserView::Detail(detail) => {
                assert_eq!(detail.summary.id, summary.id);
                assert!(detail.profile.is_some());
                assert!(!detail.is_verified);
            }
            UserView::Summary(_) => panic!("expected detail projection"),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_storage_error_propagates() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_id()
            .withf(|_, with_details| *with_details)
            .returning(|_, _| Err(DomainError::storage("connection refused")));

        let service = UserService::new(Arc::new(repository), Arc::new(MockPasswordHasher::new()));

        let result = service.get_by_id(UserId::generate(), true).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let found = service
            .get_by_email(" John@Example.com")
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(found.id, summary.id);

        let missing = service.get_by_email("nobody@example.com").await.unwrap();
        assert_eq!(
            missing.as_failure().map(Failure::kind),
            Some(FailureKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_get_all_min_reputation_is_inclusive() {
        let (service, _) = create_service();

        register(&service, "fifty@example.com").await;
        let eighty = register(&service, "eighty@example.com").await;
        let ninety_five = register(&service, "ninety-five@example.com").await;

        for (id, points) in [(eighty.id, 30.0), (ninety_five.id, 45.0)] {
            service
                .adjust_reputation(AdjustReputationRequest {
                    user_id: id,
                    points,
                })
                .await
                .unwrap()
                .into_value()
                .unwrap();
        }

        let users = service
            .get_all(&UserFilter::new().with_min_reputation(80.0))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let mut emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
        emails.sort();
        assert_eq!(emails, ["eighty@example.com", "ninety-five@example.com"]);
    }

    #[tokio::test]
    async fn test_get_all_empty_is_success() {
        let (service, _) = create_service();

        let outcome = service
            .get_all(&UserFilter::new().with_account_type(AccountType::Seller))
            .await
            .unwrap();

        assert_eq!(outcome.into_value(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_get_all_threshold_outside_score_range_is_plain_filter() {
        let (service, _) = create_service();
        register(&service, "a@example.com").await;
        register(&service, "b@example.com").await;

        let above = service
            .get_all(&UserFilter::new().with_min_reputation(150.0))
            .await
            .unwrap();
        assert_eq!(above, Outcome::Value(Vec::new()));

        let below = service
            .get_all(&UserFilter::new().with_min_reputation(-1.0))
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(below.len(), 2);
    }

    #[tokio::test]
    async fn test_get_all_rejects_nan_threshold() {
        let (service, _) = create_service();

        let outcome = service
            .get_all(&UserFilter::new().with_min_reputation(f64::NAN))
            .await
            .unwrap();
        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::Validation)
        );
    }

    #[tokio::test]
    async fn test_verify_and_revoke() {
        let (service, repository) = create_service();
        let summary = register(&service, "john@example.com").await;

        service
            .verify_user(VerifyUserRequest {
                user_id: summary.id,
                method: VerificationMethod::Email,
                notes: Some("Confirmed by link".to_string()),
            })
            .await
            .unwrap()
            .into_value()
            .unwrap();

        let user = stored(&repository, summary.id).await;
        assert!(user.is_verified());

        let verified = service
            .get_all(&UserFilter::new().with_verified(true))
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(verified.len(), 1);

        let outcome = service
            .revoke_verification(RevokeVerificationRequest {
                user_id: summary.id,
                reason: "Fraud report".to_string(),
            })
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(outcome.value().is_none());

        let user = stored(&repository, summary.id).await;
        let status = user.verification().unwrap();
        assert!(!status.is_verified());
        assert!(status.verified_at().is_none());
        assert!(status.notes().unwrap().contains("Fraud report"));

        let again = service
            .revoke_verification(RevokeVerificationRequest {
                user_id: summary.id,
                reason: "Fraud report".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            again.as_failure().map(Failure::kind),
            Some(FailureKind::BusinessRule)
        );
    }

    #[tokio::test]
    async fn test_verify_requires_method() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let outcome = service
            .verify_user(VerifyUserRequest {
                user_id: summary.id,
                method: VerificationMethod::None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::Validation)
        );
    }

    #[tokio::test]
    async fn test_adjust_reputation_clamps() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let up = service
            .adjust_reputation(AdjustReputationRequest {
                user_id: summary.id,
                points: 1000.0,
            })
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(up.reputation_score, 100.0);

        let down = service
            .adjust_reputation(AdjustReputationRequest {
                user_id: summary.id,
                points: -1000.0,
            })
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(down.reputation_score, 0.0);

        let invalid = service
            .adjust_reputation(AdjustReputationRequest {
                user_id: summary.id,
                points: f64::INFINITY,
            })
            .await
            .unwrap();
        assert!(invalid.is_failure());
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, repository) = create_service();
        let summary = register(&service, "john@example.com").await;
        let hasher = Argon2Hasher::with_params(1024, 1, 1).unwrap();

        let outcome = service
            .change_password(ChangePasswordRequest {
                user_id: summary.id,
                current_password: "SecurePass123!".to_string(),
                new_password: "NewSecret456?".to_string(),
                confirm_password: "NewSecret456?".to_string(),
            })
            .await
            .unwrap();
        assert!(outcome.is_success());

        let user = stored(&repository, summary.id).await;
        assert!(hasher.verify("NewSecret456?", user.password_hash()));
        assert!(!hasher.verify("SecurePass123!", user.password_hash()));
        assert!(user.profile().is_some());
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let (service, _) = create_service();
        let summary = register(&service, "john@example.com").await;

        let outcome = service
            .change_password(ChangePasswordRequest {
                user_id: summary.id,
                current_password: "WrongPass123!".to_string(),
                new_password: "NewSecret456?".to_string(),
                confirm_password: "NewSecret456?".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome.as_failure().map(Failure::kind),
            Some(FailureKind::BusinessRule)
        );
    }

    #[test]
    fn test_merge_field() {
        assert_eq!(merge_field(None, Some("kept")), Some("kept".to_string()));
        assert_eq!(merge_field(Some(None), Some("kept")), None);
        assert_eq!(
            merge_field(Some(Some("new".to_string())), None),
            Some("new".to_string())
        );
    }
}
