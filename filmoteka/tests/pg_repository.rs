//! Postgres store tests.
//!
//! Run with a scratch database:
//! `DATABASE_URL=postgres://... cargo test -p filmoteka -- --ignored`

use chrono::{Duration, Utc};
use filmoteka::auth::{NewUser, Role, Session};
use filmoteka::db::{AuthRepository, Database, DatabaseConfig, PgAuthRepository, StoreError};

/// Helper to create a migrated test repository
async fn setup_repository() -> PgAuthRepository {
    let config = DatabaseConfig {
        max_connections: 5,
        min_connections: 1,
        ..DatabaseConfig::from_env()
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    db.auth_repository()
}

fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: "$argon2id$v=19$placeholder".to_string(),
        role: Role::Admin,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_duplicate_username() {
    let repo = setup_repository().await;
    let username = unique_username("dup");

    repo.create_user(new_user(&username)).await.unwrap();
    let result = repo.create_user(new_user(&username)).await;
    assert!(matches!(result, Err(StoreError::Duplicate)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_session_lifecycle() {
    let repo = setup_repository().await;
    let username = unique_username("life");
    let user_id = repo.create_user(new_user(&username)).await.unwrap();

    let token = uuid::Uuid::new_v4().to_string();
    repo.create_session(Session {
        token: token.clone(),
        user_id,
        expires_at: Utc::now() + Duration::days(1),
    })
    .await
    .unwrap();

    let user = repo.get_user_by_session_id(&token).await.unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.role, Role::Admin);

    repo.delete_by_session_id(&token).await.unwrap();
    repo.delete_by_session_id(&token).await.unwrap();
    assert!(matches!(
        repo.get_user_by_session_id(&token).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_expired_session_not_found() {
    let repo = setup_repository().await;
    let user_id = repo.create_user(new_user(&unique_username("exp"))).await.unwrap();

    let token = uuid::Uuid::new_v4().to_string();
    repo.create_session(Session {
        token: token.clone(),
        user_id,
        expires_at: Utc::now() - Duration::seconds(1),
    })
    .await
    .unwrap();

    assert!(matches!(
        repo.get_user_by_session_id(&token).await,
        Err(StoreError::NotFound)
    ));
    assert!(repo.delete_expired_sessions().await.unwrap() >= 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_delete_user_cascades_to_sessions() {
    let repo = setup_repository().await;
    let username = unique_username("gone");
    let user_id = repo.create_user(new_user(&username)).await.unwrap();

    let token = uuid::Uuid::new_v4().to_string();
    repo.create_session(Session {
        token: token.clone(),
        user_id,
        expires_at: Utc::now() + Duration::days(1),
    })
    .await
    .unwrap();

    repo.delete_user(user_id).await.unwrap();
    repo.delete_user(user_id).await.unwrap();

    assert!(matches!(
        repo.get_user_by_session_id(&token).await,
        Err(StoreError::NotFound)
    ));
    assert!(repo.create_user(new_user(&username)).await.is_ok());
}
