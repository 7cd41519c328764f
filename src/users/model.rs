use sqlx::FromRow;

/// User record in the database. Not `Serialize`: responses use
/// `auth::dto::PublicUser` and the cache uses `cache::CachedUser`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,               // store-assigned
    pub email: String,         // unique, case-sensitive
    pub password_hash: String, // Argon2 PHC string
}
