use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::config::HashConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Argon2id hasher with cost parameters fixed at construction.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: Arc<str>,
}

impl CredentialHasher {
    pub fn new(cfg: &HashConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: Arc::from(""),
        };
        hasher.decoy = hasher.hash("decoy-credential")?.into();
        Ok(hasher)
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hashing(e.to_string())
            })?
            .to_string();
        if hash.is_empty() {
            return Err(PasswordError::Hashing("empty hash produced".into()));
        }
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; errors only when `hash` cannot be parsed.
    /// Parameters embedded in `hash` take precedence over the configured ones.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::MalformedHash(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spends one full verification against a throwaway hash with the configured
    /// cost, so a lookup miss costs the same as a wrong password.
    pub fn verify_decoy(&self, plain: &str) {
        let _ = self.verify(plain, &self.decoy);
    }
}
