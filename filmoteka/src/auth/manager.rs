//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{IssuedSession, LoginRequest, NewUser, Role, Session, SignUpRequest, User, UserId},
    password::{CredentialHasher, HashError},
    settings::CookieSettings,
};
use crate::db::{AuthRepository, StoreError};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;

/// Authentication manager
///
/// Stateless apart from its injected collaborators: every validation is a fresh
/// store lookup, so a logout is visible to the very next request.
#[derive(Clone)]
pub struct AuthManager {
    repository: Arc<dyn AuthRepository>,
    hasher: Arc<dyn CredentialHasher>,
    cookie_settings: CookieSettings,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `repository` - User and session store
    /// * `hasher` - Password hasher
    /// * `cookie_settings` - Cookie policy; its expiry offset also bounds session rows
    pub fn new(
        repository: Arc<dyn AuthRepository>,
        hasher: Arc<dyn CredentialHasher>,
        cookie_settings: CookieSettings,
    ) -> Self {
        Self {
            repository,
            hasher,
            cookie_settings,
        }
    }

    pub fn cookie_settings(&self) -> &CookieSettings {
        &self.cookie_settings
    }

    /// Register a new user and log them in
    ///
    /// # Errors
    ///
    /// * `AuthError::BadInput` - Empty password, invalid username or unknown role
    /// * `AuthError::UserAlreadyExists` - Username already exists
    /// * `AuthError::Internal` - Store failure; a user whose session could not
    ///   be stored is deleted again
    pub async fn sign_up(&self, request: SignUpRequest) -> AuthResult<IssuedSession> {
        validate_username(&request.username)?;
        if request.password.is_empty() {
            return Err(AuthError::BadInput("password must not be empty".to_string()));
        }
        let role = match request.role.as_deref() {
            None | Some("") => Role::default(),
            Some(role) => role.parse()?,
        };

        let password_hash = self.hasher.hash(&request.password).map_err(|e| match e {
            HashError::Empty => AuthError::BadInput("password must not be empty".to_string()),
            HashError::Algorithm(reason) => AuthError::BadInput(reason),
        })?;

        let user_id = self
            .repository
            .create_user(NewUser {
                username: request.username.clone(),
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => {
                    debug!("signup rejected, username '{}' taken", request.username);
                    AuthError::UserAlreadyExists
                }
                other => AuthError::Internal(other.to_string()),
            })?;

        match self.create_session(user_id).await {
            Ok(issued) => {
                info!("registered user {} ({}) with role {}", user_id, request.username, role);
                Ok(issued)
            }
            Err(err) => {
                // Undo the user row so the username stays free for a retry
                if let Err(cleanup) = self.repository.delete_user(user_id).await {
                    warn!("failed to roll back user {} after session error: {}", user_id, cleanup);
                }
                Err(err)
            }
        }
    }

    /// Login a user
    ///
    /// Existing sessions of the user stay valid; each login adds one.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotFound` - User doesn't exist
    /// * `AuthError::PasswordMismatch` - Incorrect password
    /// * `AuthError::Internal` - Store failure
    pub async fn login(&self, request: LoginRequest) -> AuthResult<IssuedSession> {
        let user = self
            .repository
            .get_user_by_username(&request.username)
            .await?;

        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!("password mismatch for user {}", user.id);
            return Err(AuthError::PasswordMismatch);
        }

        self.create_session(user.id).await
    }

    /// Logout by deleting the session.
    ///
    /// Idempotent: an unknown or already deleted token is not an error, so the
    /// response never reveals whether a token was ever issued.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        self.repository
            .delete_by_session_id(token)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Resolve a session token to the owning user ID
    ///
    /// # Errors
    ///
    /// * `AuthError::NotFound` - Session absent, deleted or expired
    pub async fn auth(&self, token: &str) -> AuthResult<UserId> {
        Ok(self.repository.get_user_by_session_id(token).await?.id)
    }

    /// Resolve a session token to the owner's profile, role included
    pub async fn user_by_session_id(&self, token: &str) -> AuthResult<User> {
        Ok(self.repository.get_user_by_session_id(token).await?.into())
    }

    /// Drop expired session rows. Validation never depends on this having run.
    pub async fn purge_expired_sessions(&self) -> AuthResult<u64> {
        Ok(self.repository.delete_expired_sessions().await?)
    }

    pub async fn health_check(&self) -> AuthResult<()> {
        Ok(self.repository.health_check().await?)
    }

    /// Mint, persist and return a new session for `user_id`
    async fn create_session(&self, user_id: UserId) -> AuthResult<IssuedSession> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: self.cookie_settings.expire_offset.expiry_from(Utc::now()),
        };
        let expires_at = session.expires_at;

        let token = self
            .repository
            .create_session(session)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        debug!("issued session for user {} expiring at {}", user_id, expires_at);
        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::BadInput(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AuthError::BadInput(
            "username can only contain letters, numbers, '_', '-' and '.'".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ExpireOffset, UserRecord};
    use crate::db::InMemoryAuthRepository;

    /// Reversible stand-in so tests don't pay for argon2
    struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, plaintext: &str) -> Result<String, HashError> {
            if plaintext.is_empty() {
                return Err(HashError::Empty);
            }
            Ok(format!("plain:{plaintext}"))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> bool {
            hash.strip_prefix("plain:") == Some(plaintext)
        }
    }

    fn manager() -> (AuthManager, Arc<InMemoryAuthRepository>) {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let manager = AuthManager::new(repo.clone(), Arc::new(PlainHasher), CookieSettings::default());
        (manager, repo)
    }

    fn signup(username: &str, password: &str, role: Option<&str>) -> SignUpRequest {
        SignUpRequest {
            username: username.to_string(),
            password: password.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jane").is_ok());
        assert!(validate_username("jane.doe-1_x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("jane;drop").is_err());
    }

    #[tokio::test]
    async fn test_signup_defaults_to_user_role() {
        let (manager, _) = manager();
        let issued = manager.sign_up(signup("jane", "secret", None)).await.unwrap();
        let user = manager.user_by_session_id(&issued.token).await.unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_signup_rejects_unknown_role() {
        let (manager, repo) = manager();
        let result = manager.sign_up(signup("jane", "secret", Some("root"))).await;
        assert!(matches!(result, Err(AuthError::BadInput(_))));
        assert_eq!(repo.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_signup_rejects_empty_password() {
        let (manager, repo) = manager();
        let result = manager.sign_up(signup("jane", "", None)).await;
        assert!(matches!(result, Err(AuthError::BadInput(_))));
        assert_eq!(repo.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_session_expiry_follows_cookie_settings() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let settings = CookieSettings {
            expire_offset: ExpireOffset::days(3),
            ..CookieSettings::default()
        };
        let manager = AuthManager::new(repo, Arc::new(PlainHasher), settings);

        let before = Utc::now();
        let issued = manager.sign_up(signup("jane", "secret", None)).await.unwrap();
        let after = Utc::now();

        assert!(issued.expires_at >= before + chrono::Duration::days(3));
        assert!(issued.expires_at <= after + chrono::Duration::days(3));
    }

    #[tokio::test]
    async fn test_tokens_are_unique_uuids() {
        let (manager, _) = manager();
        let first = manager.sign_up(signup("jane", "secret", None)).await.unwrap();
        let second = manager
            .login(LoginRequest {
                username: "jane".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_ne!(first.token, second.token);
        assert!(Uuid::parse_str(&first.token).is_ok());
        assert!(Uuid::parse_str(&second.token).is_ok());
    }

    #[tokio::test]
    async fn test_purge_keeps_live_sessions() {
        let (manager, repo) = manager();
        let issued = manager.sign_up(signup("jane", "secret", None)).await.unwrap();
        assert_eq!(manager.purge_expired_sessions().await.unwrap(), 0);
        assert_eq!(repo.session_count().await, 1);
        assert_eq!(manager.auth(&issued.token).await.unwrap(), issued.user_id);
    }

    /// Store whose session writes always fail
    struct SessionWriteFails(InMemoryAuthRepository);

    #[async_trait::async_trait]
    impl AuthRepository for SessionWriteFails {
        async fn create_user(&self, user: NewUser) -> crate::db::StoreResult<UserId> {
            self.0.create_user(user).await
        }

        async fn delete_user(&self, user_id: UserId) -> crate::db::StoreResult<()> {
            self.0.delete_user(user_id).await
        }

        async fn create_session(&self, _session: Session) -> crate::db::StoreResult<String> {
            Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
        }

        async fn delete_by_session_id(&self, token: &str) -> crate::db::StoreResult<()> {
            self.0.delete_by_session_id(token).await
        }

        async fn get_user_by_session_id(&self, token: &str) -> crate::db::StoreResult<UserRecord> {
            self.0.get_user_by_session_id(token).await
        }

        async fn get_user_by_username(&self, username: &str) -> crate::db::StoreResult<UserRecord> {
            self.0.get_user_by_username(username).await
        }

        async fn delete_expired_sessions(&self) -> crate::db::StoreResult<u64> {
            self.0.delete_expired_sessions().await
        }

        async fn health_check(&self) -> crate::db::StoreResult<()> {
            self.0.health_check().await
        }
    }

    #[tokio::test]
    async fn test_failed_session_write_rolls_back_user() {
        let repo = Arc::new(SessionWriteFails(InMemoryAuthRepository::new()));
        let manager = AuthManager::new(repo.clone(), Arc::new(PlainHasher), CookieSettings::default());

        let result = manager.sign_up(signup("jane", "secret", None)).await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert_eq!(repo.0.user_count().await, 0);

        // A retry is not blocked by a leftover row
        let retry = manager.sign_up(signup("jane", "secret", None)).await;
        assert!(matches!(retry, Err(AuthError::Internal(_))));
        assert!(matches!(
            repo.0.get_user_by_username("jane").await,
            Err(StoreError::NotFound)
        ));
    }
}
