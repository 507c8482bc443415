//! User service
//!
//! Signup, login/logout and session validation. A session is a row in the
//! `sessions` table whose id is the token stored in the session cookie.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User, USERNAME_MAX_LENGTH};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Default session expiration time in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// How long a new session lasts
    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_expiration_days)
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the username or password is empty, or the
    ///   username is too long
    /// - `UserExists` if the username is taken
    pub async fn signup(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Username cannot exceed {} characters",
                USERNAME_MAX_LENGTH
            )));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(username.to_string()));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&User::new(username.to_string(), password_hash))
            .await
            .context("Failed to create user")?;

        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Check credentials and open a new session
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, UserServiceError> {
        let invalid =
            || UserServiceError::AuthenticationError("Invalid username or password".to_string());

        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("Failed to get user by username")?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash).context("Failed to verify password")? {
            tracing::debug!("Wrong password for user {}", user.id);
            return Err(invalid());
        }

        let session = self
            .session_repo
            .create(&Session::start(user.id, self.session_lifetime()))
            .await
            .context("Failed to create session")?;

        tracing::info!("User {} logged in", user.id);
        Ok(session)
    }

    /// Close a session; closing an unknown session is not an error
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// The user a session token belongs to
    ///
    /// Returns `None` for unknown tokens. Expired sessions are deleted and
    /// also yield `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service_with_expiration(days: i64) -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            days,
        )
    }

    async fn setup_test_service() -> UserService {
        setup_test_service_with_expiration(DEFAULT_SESSION_EXPIRATION_DAYS).await
    }

    #[tokio::test]
    async fn test_signup() {
        let service = setup_test_service().await;

        let user = service
            .signup(CreateUserInput::new("Автор", "pass"))
            .await
            .expect("Failed to sign up");

        assert!(user.id > 0);
        assert_eq!(user.username, "Автор");
        assert_ne!(user.password_hash, "pass");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_signup_duplicate_username_fails() {
        let service = setup_test_service().await;
        service.signup(CreateUserInput::new("Автор", "pass")).await.unwrap();

        let result = service.signup(CreateUserInput::new("Автор", "other")).await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let service = setup_test_service().await;

        for input in [
            CreateUserInput::new("  ", "pass"),
            CreateUserInput::new("Автор", ""),
            CreateUserInput::new("a".repeat(USERNAME_MAX_LENGTH + 1), "pass"),
        ] {
            let result = service.signup(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let service = setup_test_service().await;
        let user = service.signup(CreateUserInput::new("Автор", "123")).await.unwrap();

        let session = service.login("Автор", "123").await.expect("Login should succeed");
        assert_eq!(session.user_id, user.id);

        let validated = service
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("Session should be valid");
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = setup_test_service().await;
        service.signup(CreateUserInput::new("Автор", "123")).await.unwrap();

        let wrong_password = service.login("Автор", "321").await.unwrap_err();
        let unknown_user = service.login("Не автор", "123").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, UserServiceError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_validate_unknown_session() {
        let service = setup_test_service().await;
        assert!(service.validate_session("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let service = setup_test_service_with_expiration(-1).await;
        service.signup(CreateUserInput::new("Автор", "123")).await.unwrap();

        let session = service.login("Автор", "123").await.unwrap();
        assert!(session.is_expired());

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        // Already removed by the validation above
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let service = setup_test_service_with_expiration(-1).await;
        service.signup(CreateUserInput::new("Автор", "123")).await.unwrap();
        service.login("Автор", "123").await.unwrap();
        service.login("Автор", "123").await.unwrap();

        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup_test_service().await;
        service.signup(CreateUserInput::new("Автор", "123")).await.unwrap();
        let session = service.login("Автор", "123").await.unwrap();

        service.logout(&session.id).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        // Logging out twice is fine
        service.logout(&session.id).await.unwrap();
    }
}
