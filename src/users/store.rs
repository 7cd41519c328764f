use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error};

use crate::users::model::User;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user with this email already exists")]
    DuplicateUser,

    #[error("user store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                StoreError::DuplicateUser
            }
            _ => StoreError::Unavailable(err),
        }
    }
}

/// Durable user storage. Email uniqueness is enforced by the store itself.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return the assigned id.
    async fn insert(&self, email: &str, password_hash: &str) -> Result<i64, StoreError>;

    /// Exact-match lookup; `Ok(None)` when no row exists.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = StoreError::from(e);
            if let StoreError::Unavailable(inner) = &err {
                error!(error = %inner, "insert user failed");
            }
            err
        })?;
        debug!(user_id = id, "user row inserted");
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "select user by email failed");
            StoreError::from(e)
        })?;
        Ok(user)
    }
}
