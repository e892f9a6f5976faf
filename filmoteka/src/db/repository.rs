//! Repository trait definitions for testability and dependency injection.
//!
//! The auth manager talks to persistence only through [`AuthRepository`], so the
//! Postgres implementation and the in-memory one are interchangeable.

use async_trait::async_trait;

use super::errors::StoreResult;
use crate::auth::{NewUser, Session, UserId, UserRecord};

/// User and session persistence
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Create a new user
    ///
    /// Fails with `StoreError::Duplicate` if the username is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId>;

    /// Delete a user and, through the foreign key, its sessions.
    /// Deleting an unknown user is not an error.
    async fn delete_user(&self, user_id: UserId) -> StoreResult<()>;

    /// Persist a session and return its token once the write is acknowledged
    async fn create_session(&self, session: Session) -> StoreResult<String>;

    /// Delete a session by token. Deleting an unknown token is not an error.
    async fn delete_by_session_id(&self, token: &str) -> StoreResult<()>;

    /// Resolve the owner of a session
    ///
    /// Fails with `StoreError::NotFound` if the session is absent or expired.
    async fn get_user_by_session_id(&self, token: &str) -> StoreResult<UserRecord>;

    /// Find user by username
    async fn get_user_by_username(&self, username: &str) -> StoreResult<UserRecord>;

    /// Remove sessions whose expiry has passed, returning how many were removed
    async fn delete_expired_sessions(&self) -> StoreResult<u64>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;
}
