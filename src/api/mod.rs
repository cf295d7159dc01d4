pub(crate) mod health;
pub(crate) mod oauth;
pub(crate) mod user;

use crate::state::AppState;
use axum::{middleware, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(oauth::router())
        .merge(protected_routes(state))
}

/// Creates a router for routes that require a bearer token issued by the
/// token endpoint
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new().merge(user::router()).layer(middleware::from_fn_with_state(
        state.clone(),
        user::require_bearer,
    ))
}
