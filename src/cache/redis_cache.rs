use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::info;

use super::{CacheClient, CacheError};

/// Redis-backed cache. `ConnectionManager` multiplexes one connection and
/// reconnects on its own, so clones are cheap.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("parse redis url")?;
        let mut conn = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("ping redis")?;
        info!(%pong, "redis connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
