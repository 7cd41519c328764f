use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::cache::UserCache;
use crate::users::{
    model::User,
    store::{StoreError, UserStore},
};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User lookup across the durable store and the volatile cache.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    cache: UserCache,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>, cache: UserCache) -> Self {
        Self { store, cache }
    }

    /// Inserts into the store only; the first read fills the cache.
    #[instrument(skip(self, password_hash))]
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        self.store.insert(email, password_hash).await
    }

    /// Cache first, then the store. A store hit refills the cache; absence is not cached.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<User, DirectoryError> {
        if let Some(user) = self.cache.get(email).await {
            return Ok(user);
        }

        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;
        debug!(user_id = user.id, "user loaded from store");

        self.cache.put(email, &user).await;
        Ok(user)
    }

    pub async fn invalidate(&self, email: &str) {
        self.cache.invalidate(email).await;
    }
}
