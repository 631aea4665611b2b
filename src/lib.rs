pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod readiness;
pub mod repository;
pub mod sqlite_repo;
pub mod token;
pub mod util;
pub mod validation;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use repository::AccountRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AccountRepository>,
    pub min_password_length: usize,
}

// The auth layer sits on the method router so an unsupported method on
// /me/ is answered with 405 before credentials are checked.
fn authenticated_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/api/user/me/",
        get(handlers::profile::get_profile)
            .patch(handlers::profile::update_profile)
            .route_layer(axum_middleware::from_fn_with_state(
                state,
                middleware::auth::require_auth_token,
            )),
    )
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create/", post(handlers::users::create_user))
        .route("/api/user/token/", post(handlers::token::issue_token))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Build the full application router (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(authenticated_routes(state.clone()))
        .merge(public_routes())
        .merge(health_routes())
        .with_state(state)
}
