use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

/// Session tokens are valid for 24 hours from issuance.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Cached user snapshots expire after 30 minutes.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub user_ttl: Duration,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: PgConnectOptions,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Discrete DB_* parts go through the options builder, never a URL,
        // so reserved characters in the password stay literal.
        let database = match var("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).context("parse DATABASE_URL")?,
            None => {
                let port = match var("DB_PORT") {
                    Some(p) => p
                        .parse::<u16>()
                        .with_context(|| format!("DB_PORT must be a port number, got {p:?}"))?,
                    None => 5432,
                };
                let mut opts = PgConnectOptions::new()
                    .host(&var("DB_HOST").unwrap_or_else(|| "localhost".into()))
                    .port(port)
                    .username(&var("DB_USER").context("DATABASE_URL or DB_USER must be set")?)
                    .database(&var("DB_NAME").context("DATABASE_URL or DB_NAME must be set")?);
                if let Some(password) = var("DB_PASSWORD") {
                    opts = opts.password(&password);
                }
                opts
            }
        };

        let redis_url = var("REDIS_URL").unwrap_or_else(|| {
            format!(
                "redis://{}:{}",
                var("REDIS_HOST").unwrap_or_else(|| "localhost".into()),
                var("REDIS_PORT").unwrap_or_else(|| "6379".into()),
            )
        });

        let secret = var("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET is not set")?;

        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().with_context(|| {
                format!("REQUEST_TIMEOUT_SECS must be whole seconds, got {v:?}")
            })?,
            None => 10,
        };

        Ok(Self {
            database,
            cache: CacheConfig {
                redis_url,
                user_ttl: USER_CACHE_TTL,
            },
            jwt: JwtConfig {
                secret,
                ttl: SESSION_TTL,
            },
            hash: HashConfig::default(),
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}
