use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::dto::ErrorBody;

/// Outcomes visible to API callers. Internal causes are logged where they
/// happen and never carried in these variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("user with this email already exists")]
    DuplicateUser,

    /// Unknown email and wrong password both end up here.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("internal server error")]
    Internal,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = match &self {
            AuthError::Validation(details) => ErrorBody {
                error: "invalid request".into(),
                details: Some(details.clone()),
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}
