//! PostgreSQL implementation of [`AuthRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::time::Duration;

use super::{
    errors::{StoreError, StoreResult},
    repository::AuthRepository,
    timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout},
};
use crate::auth::{NewUser, Role, Session, UserId, UserRecord};

/// Default PostgreSQL implementation of `AuthRepository`
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<UserRecord> {
    let role: String = row.try_get("role")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: role
            .parse::<Role>()
            .map_err(|_| StoreError::Corrupt(format!("unknown role '{role}'")))?,
    })
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn create_session(&self, session: Session) -> StoreResult<String> {
        with_timeout(
            self.query_timeout,
            sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
                .bind(&session.token)
                .bind(session.user_id)
                .bind(session.expires_at)
                .execute(&self.pool),
        )
        .await?;

        Ok(session.token)
    }

    async fn delete_by_session_id(&self, token: &str) -> StoreResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM sessions WHERE token = $1")
                .bind(token)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_user_by_session_id(&self, token: &str) -> StoreResult<UserRecord> {
        let now: DateTime<Utc> = Utc::now();
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                r#"
                SELECT u.id, u.username, u.password_hash, u.role
                FROM sessions s
                JOIN users u ON u.id = s.user_id
                WHERE s.token = $1 AND s.expires_at > $2
                "#,
            )
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)?;

        user_from_row(&row)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT id, username, password_hash, role FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)?;

        user_from_row(&row)
    }

    async fn delete_expired_sessions(&self) -> StoreResult<u64> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
                .bind(Utc::now())
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> StoreResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
