//! Password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Hashing failure
#[derive(Debug, Error)]
pub enum HashError {
    #[error("password must not be empty")]
    Empty,

    #[error("hashing failed: {0}")]
    Algorithm(String),
}

/// One-way credential hashing.
///
/// Implementations embed the salt in the returned hash so that `verify` needs
/// nothing but the stored string.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// Returns false on mismatch or on an unparseable hash, never an error.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id hasher with a server-side pepper
#[derive(Clone)]
pub struct Argon2Hasher {
    pepper: String,
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
            argon2: Argon2::default(),
        }
    }

    fn peppered(&self, plaintext: &str) -> String {
        format!("{}{}", plaintext, self.pepper)
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.is_empty() {
            return Err(HashError::Empty);
        }

        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(self.peppered(plaintext).as_bytes(), &salt)
            .map_err(|e| HashError::Algorithm(e.to_string()))?
            .to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(self.peppered(plaintext).as_bytes(), &parsed_hash)
            .is_ok()
    }
}
