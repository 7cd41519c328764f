use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use service::AuthService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
