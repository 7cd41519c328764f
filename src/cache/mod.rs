//! Volatile user cache in front of the durable store.
//!
//! The cache only ever holds a copy of a `User`. Anything that goes wrong here
//! (backend down, undecodable entry) is logged and reported as a miss so the
//! caller falls back to the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::users::User;

mod redis_cache;

pub use redis_cache::RedisCache;

const USER_KEY_PREFIX: &str = "user:";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("cache entry encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Byte-level key/value operations of the cache backend.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Serialized snapshot of a `User` as stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

impl CachedUser {
    /// An entry may only be served if it carries a hash and belongs to the key it was read from.
    pub fn is_valid_for(&self, email: &str) -> bool {
        !self.password_hash.trim().is_empty() && self.email == email
    }
}

impl From<&User> for CachedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        }
    }
}

impl From<CachedUser> for User {
    fn from(entry: CachedUser) -> Self {
        Self {
            id: entry.id,
            email: entry.email,
            password_hash: entry.password_hash,
        }
    }
}

#[derive(Clone)]
pub struct UserCache {
    client: Arc<dyn CacheClient>,
    ttl: Duration,
}

impl UserCache {
    pub fn new(client: Arc<dyn CacheClient>, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(email: &str) -> String {
        format!("{USER_KEY_PREFIX}{email}")
    }

    /// Returns a valid cached user, or `None` on miss, corrupt entry, or backend failure.
    /// Corrupt entries are deleted before returning.
    pub async fn get(&self, email: &str) -> Option<User> {
        let key = Self::key(email);
        let bytes = match self.client.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%key, "user cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, %key, "user cache degraded on get; falling back to store");
                return None;
            }
        };

        match serde_json::from_slice::<CachedUser>(&bytes) {
            Ok(entry) if entry.is_valid_for(email) => {
                debug!(%key, user_id = entry.id, "user cache hit");
                Some(entry.into())
            }
            Ok(entry) => {
                warn!(%key, user_id = entry.id, "invalid cached user entry; purging");
                self.purge(&key).await;
                None
            }
            Err(e) => {
                warn!(error = %e, %key, "undecodable cached user entry; purging");
                self.purge(&key).await;
                None
            }
        }
    }

    /// Best-effort write; failures are logged and swallowed.
    pub async fn put(&self, email: &str, user: &User) {
        let key = Self::key(email);
        if let Err(e) = self.try_put(&key, user).await {
            warn!(error = %e, %key, "user cache degraded on put");
        }
    }

    async fn try_put(&self, key: &str, user: &User) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(&CachedUser::from(user))?;
        self.client.set(key, bytes, self.ttl).await?;
        debug!(%key, ttl_secs = self.ttl.as_secs(), "user cached");
        Ok(())
    }

    /// Drops the cached copy for `email`. Call after any mutation of the stored user.
    pub async fn invalidate(&self, email: &str) {
        self.purge(&Self::key(email)).await;
    }

    async fn purge(&self, key: &str) {
        if let Err(e) = self.client.delete(key).await {
            warn!(error = %e, %key, "user cache degraded on delete");
        }
    }
}
