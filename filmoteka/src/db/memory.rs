//! In-memory implementation of [`AuthRepository`].
//!
//! Mirrors the Postgres constraints (unique usernames, unique session tokens,
//! sessions referencing existing users) so that service and HTTP tests observe
//! the same failure modes as production.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    errors::{StoreError, StoreResult},
    repository::AuthRepository,
};
use crate::auth::{NewUser, Session, UserId, UserRecord};

#[derive(Default)]
struct Tables {
    next_user_id: UserId,
    users: HashMap<UserId, UserRecord>,
    usernames: HashMap<String, UserId>,
    sessions: HashMap<String, Session>,
}

/// Process-local user and session store
#[derive(Default)]
pub struct InMemoryAuthRepository {
    tables: Mutex<Tables>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Number of stored sessions, expired ones included
    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }
}

#[async_trait]
impl AuthRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId> {
        let mut tables = self.tables.lock().await;
        if tables.usernames.contains_key(&user.username) {
            return Err(StoreError::Duplicate);
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.usernames.insert(user.username.clone(), id);
        tables.users.insert(
            id,
            UserRecord {
                id,
                username: user.username,
                password_hash: user.password_hash,
                role: user.role,
            },
        );
        Ok(id)
    }

    async fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.remove(&user_id) {
            tables.usernames.remove(&user.username);
            tables.sessions.retain(|_, session| session.user_id != user_id);
        }
        Ok(())
    }

    async fn create_session(&self, session: Session) -> StoreResult<String> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&session.user_id) {
            return Err(StoreError::NotFound);
        }
        if tables.sessions.contains_key(&session.token) {
            return Err(StoreError::Duplicate);
        }

        let token = session.token.clone();
        tables.sessions.insert(token.clone(), session);
        Ok(token)
    }

    async fn delete_by_session_id(&self, token: &str) -> StoreResult<()> {
        self.tables.lock().await.sessions.remove(token);
        Ok(())
    }

    async fn get_user_by_session_id(&self, token: &str) -> StoreResult<UserRecord> {
        let tables = self.tables.lock().await;
        let session = tables.sessions.get(token).ok_or(StoreError::NotFound)?;
        if session.is_expired_at(Utc::now()) {
            return Err(StoreError::NotFound);
        }

        tables
            .users
            .get(&session.user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        let tables = self.tables.lock().await;
        tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_expired_sessions(&self) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
