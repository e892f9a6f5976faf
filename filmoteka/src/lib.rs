//! # Filmoteka
//!
//! Session-cookie authentication and role-based access for the filmoteka movie
//! library backend.
//!
//! ## Core Modules
//!
//! - [`auth`]: Password hashing, session issuance and validation, roles
//! - [`db`]: Connection pooling and the user/session store
//!
//! ## Session lifecycle
//!
//! A session token is `absent` until signup or login issues it, `active` until
//! its expiry instant, then `expired`. Logout deletes the row, which makes the
//! token indistinguishable from one that was never issued.

/// Authentication: users, sessions, password hashing.
pub mod auth;

/// Persistence: pool, store contract, Postgres and in-memory stores.
pub mod db;

pub use auth::{AuthError, AuthManager, CookieSettings, ExpireOffset, Role, User, UserId};
