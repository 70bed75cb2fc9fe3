pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// Account, session and family routes, nested under `/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(crate::family::handlers::family_routes())
}
