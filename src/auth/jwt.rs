use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, users::User};

/// Session tokens are always HS256; the algorithm is not configurable.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT payload issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
}

#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: cfg.ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }
}
