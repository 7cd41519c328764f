use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::auth::{jwt::SessionIssuer, password::CredentialHasher, AuthService};
use crate::cache::{RedisCache, UserCache};
use crate::config::AppConfig;
use crate::users::{PgUserStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

/// Handles that outlive the router: the pool is needed for migrations.
pub struct Resources {
    pub db: PgPool,
    pub state: AppState,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Resources> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(config.request_timeout)
            .connect_with(config.database.clone())
            .await
            .context("connect to database")?;
        info!("postgres connected");

        let redis = RedisCache::connect(&config.cache.redis_url).await?;

        let directory = UserDirectory::new(
            Arc::new(PgUserStore::new(db.clone())),
            UserCache::new(Arc::new(redis), config.cache.user_ttl),
        );
        let hasher = CredentialHasher::new(&config.hash).context("argon2 parameters")?;
        let issuer = SessionIssuer::new(&config.jwt);

        let state = Self::from_parts(Arc::new(AuthService::new(hasher, directory, issuer)));
        Ok(Resources { db, state })
    }

    pub fn from_parts(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}
