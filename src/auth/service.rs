use tracing::{error, info, instrument, warn};

use crate::auth::{
    error::AuthError,
    jwt::{SessionIssuer, TokenError},
    password::{CredentialHasher, PasswordError},
};
use crate::users::{DirectoryError, StoreError, UserDirectory};

/// Sequences the register and login flows and collapses internal failures
/// into `AuthError`.
pub struct AuthService {
    hasher: CredentialHasher,
    directory: UserDirectory,
    issuer: SessionIssuer,
}

impl AuthService {
    pub fn new(hasher: CredentialHasher, directory: UserDirectory, issuer: SessionIssuer) -> Self {
        Self {
            hasher,
            directory,
            issuer,
        }
    }

    /// Hash, then insert. Returns the new user id.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        let hash = self.hash(password).await.map_err(|e| {
            error!(error = %e, "hash_password failed");
            AuthError::Internal
        })?;

        match self.directory.create(email, &hash).await {
            Ok(user_id) => {
                info!(user_id, "user registered");
                Ok(user_id)
            }
            Err(StoreError::DuplicateUser) => {
                warn!("email already registered");
                Err(AuthError::DuplicateUser)
            }
            Err(StoreError::Unavailable(e)) => {
                error!(error = %e, "create user failed");
                Err(AuthError::Internal)
            }
        }
    }

    /// Lookup, verify, sign. Unknown email and wrong password are indistinguishable
    /// to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.directory.get_by_email(email).await {
            Ok(user) => user,
            Err(DirectoryError::UserNotFound) => {
                warn!("login unknown email");
                self.verify_decoy(password).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(DirectoryError::Store(e)) => {
                error!(error = %e, "get_by_email failed");
                return Err(AuthError::Internal);
            }
        };

        match self.verify(password, &user.password_hash).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = user.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, user_id = user.id, "verify_password failed");
                return Err(AuthError::Internal);
            }
        }

        let token = self.issuer.issue(&user).map_err(|e: TokenError| {
            error!(error = %e, user_id = user.id, "jwt sign failed");
            AuthError::Internal
        })?;

        info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
    }

    async fn verify_decoy(&self, password: &str) {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let task = tokio::task::spawn_blocking(move || hasher.verify_decoy(&password));
        if let Err(e) = task.await {
            error!(error = %e, "decoy verify task failed");
        }
    }
}
