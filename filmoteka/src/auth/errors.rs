//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input: empty password, invalid username or role
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Unknown user or session
    #[error("Not found")]
    NotFound,

    /// Username already exists
    #[error("User already exists")]
    UserAlreadyExists,

    /// Password does not match the stored hash
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// No valid session
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid session, insufficient role
    #[error("Forbidden")]
    Forbidden,

    /// Unexpected store or hashing failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Internal failures carry store or hasher detail and are replaced with a
    /// generic message.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Duplicate => AuthError::UserAlreadyExists,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
