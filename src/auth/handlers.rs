use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, RegisterResponse, TokenResponse},
        error::AuthError,
    },
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AuthError::Validation("email is not a valid address".into()));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let id = state.auth.register(&payload.email, &payload.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user registered".into(),
            user: PublicUser {
                id,
                email: payload.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AuthError::Validation("email is not a valid address".into()));
    }

    if payload.password.is_empty() {
        return Err(AuthError::Validation("password is required".into()));
    }

    let token = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::harness;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let h = harness();
        auth_routes().with_state(AppState::from_parts(h.service))
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[tokio::test]
    async fn register_and_login_over_http() {
        let app = app();

        let (status, body) = post_json(
            &app,
            "/register",
            json!({"email": " a@x.com ", "password": "secret1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(body["user"].get("password_hash").is_none());

        let (status, body) =
            post_json(&app, "/register", json!({"email": "a@x.com", "password": "other1"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());

        let (status, body) =
            post_json(&app, "/login", json!({"email": "a@x.com", "password": "secret1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let app = app();
        post_json(&app, "/register", json!({"email": "a@x.com", "password": "secret1"})).await;

        let wrong =
            post_json(&app, "/login", json!({"email": "a@x.com", "password": "wrong1"})).await;
        let unknown =
            post_json(&app, "/login", json!({"email": "b@x.com", "password": "x"})).await;

        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let app = app();

        let (status, body) =
            post_json(&app, "/register", json!({"email": "nope", "password": "secret1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].is_string());

        let (status, _) =
            post_json(&app, "/register", json!({"email": "a@x.com", "password": "12345"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            post_json(&app, "/login", json!({"email": "a@x.com", "password": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
