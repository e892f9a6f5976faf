//! Authentication module providing signup, login, and session management.
//!
//! This module implements cookie-session authentication with:
//! - Argon2id password hashing with server-side pepper
//! - Opaque UUID v4 session tokens persisted with a fixed expiry
//! - Lazy expiry: sessions are checked against their expiry on every lookup
//! - Closed role set used by the access gate
//!
//! ## Example
//!
//! ```no_run
//! use filmoteka::auth::{Argon2Hasher, AuthManager, CookieSettings, SignUpRequest};
//! use filmoteka::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(db.auth_repository()),
//!         Arc::new(Argon2Hasher::new("server_side_pepper")),
//!         CookieSettings::default(),
//!     );
//!
//!     let issued = auth
//!         .sign_up(SignUpRequest {
//!             username: "jane".to_string(),
//!             password: "secret".to_string(),
//!             role: None,
//!         })
//!         .await?;
//!     println!("user {} got session {}", issued.user_id, issued.token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod settings;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    IssuedSession, LoginRequest, NewUser, Role, Session, SignUpRequest, User, UserId, UserRecord,
};
pub use password::{Argon2Hasher, CredentialHasher, HashError};
pub use settings::{CookieSettings, ExpireOffset};
