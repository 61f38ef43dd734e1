use crate::state::AppState;
use axum::Router;

pub mod cookies;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
