//! Authentication service
//!
//! Implements account and session lifecycle: signup, login, logout and
//! session token resolution. Sessions are random UUID tokens stored
//! server-side; the HTTP layer carries only the token in a cookie.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Login credentials did not match. One variant for both unknown
    /// username and wrong password, so the API cannot leak which it was.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Username already taken at signup
    #[error("Username already exists")]
    UsernameTaken,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Input for user signup
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub password: String,
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Service for account management and session validation
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl AuthService {
    /// Create a new auth service with the default session expiration
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new auth service with a custom session expiration
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

    /// Register a new account and open a session for it.
    ///
    /// The username is checked for uniqueness up front; the unique
    /// constraint on the column is the backstop for two concurrent signups
    /// racing past the check, and a constraint violation maps to
    /// `UsernameTaken` rather than an internal error.
    pub async fn signup(&self, input: SignupInput) -> Result<(User, Session), AuthError> {
        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, password_hash);

        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::UsernameTaken),
            Err(e) => return Err(AuthError::Internal(e.context("Failed to create user"))),
        };

        tracing::info!(user_id = created.id, "New user signed up");

        let session = self.create_session(created.id).await?;
        Ok((created, session))
    }

    /// Authenticate credentials and open a session.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), AuthError> {
        let user = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.create_session(user.id).await?;
        tracing::debug!(user_id = user.id, "User logged in");
        Ok((user, session))
    }

    /// Invalidate a session token.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its stored session.
    ///
    /// An expired session behaves as absent and is lazily deleted.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Get the user a session belongs to, if the account still exists.
    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Delete all expired sessions; maintenance operation.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, AuthError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, AuthError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Check whether an error chain bottoms out in a unique constraint
/// violation.
fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        AuthService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    fn credentials(username: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_session() {
        let service = setup().await;

        let (user, session) = service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        assert!(user.id > 0);
        assert_eq!(session.user_id, user.id);
        assert!(!session.is_expired());
        // Stored hash is not the plaintext
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let service = setup().await;
        service
            .signup(credentials("painter"))
            .await
            .expect("First signup failed");

        let result = service.signup(credentials("painter")).await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_login_with_correct_credentials() {
        let service = setup().await;
        let (user, _) = service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        let (logged_in, session) = service
            .login(LoginInput {
                username: "painter".to_string(),
                password: "password123".to_string(),
            })
            .await
            .expect("Login failed");

        assert_eq!(logged_in.id, user.id);
        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = setup().await;
        service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        let wrong_password = service
            .login(LoginInput {
                username: "painter".to_string(),
                password: "nope".to_string(),
            })
            .await;
        let unknown_user = service
            .login(LoginInput {
                username: "stranger".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_resolve_session() {
        let service = setup().await;
        let (user, session) = service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        let resolved = service
            .resolve_session(&session.id)
            .await
            .expect("Resolution errored")
            .expect("Session not found");
        assert_eq!(resolved.user_id, user.id);

        let missing = service
            .resolve_session("no-such-token")
            .await
            .expect("Resolution errored");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        let (_, session) = service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        service.logout(&session.id).await.expect("Logout failed");

        let resolved = service
            .resolve_session(&session.id)
            .await
            .expect("Resolution errored");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_behaves_as_absent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = AuthService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            -1, // Sessions are born expired
        );

        let (_, session) = service
            .signup(credentials("painter"))
            .await
            .expect("Signup failed");

        let resolved = service
            .resolve_session(&session.id)
            .await
            .expect("Resolution errored");
        assert!(resolved.is_none());

        // The expired row was lazily deleted
        assert_eq!(
            service
                .cleanup_expired_sessions()
                .await
                .expect("Cleanup failed"),
            0
        );
    }
}
