use crate::state::AppState;
use axum::{response::IntoResponse, routing::get, Json, Router};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "OAuth 2.0";
pub(crate) const GITHUB_TAG: &str = "GitHub";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::health::ready_check,
        crate::api::oauth::handlers::authorize,
        crate::api::oauth::handlers::github_callback,
        crate::api::oauth::handlers::token,
        crate::api::oauth::handlers::register,
        crate::api::oauth::handlers::revoke,
        crate::api::oauth::handlers::discovery,
        crate::api::user::user_profile,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "OAuth 2.0 authorization server endpoints"),
        (name = GITHUB_TAG, description = "GitHub integration endpoints"),
    ),
    info(
        title = "MCP Auth Bridge API",
        description = "OAuth 2.0 authorization server bridging MCP clients to GitHub",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

/// Handler for the OpenAPI JSON specification endpoint
async fn openapi_json_handler() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Creates a router for OpenAPI documentation routes
pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json_handler))
}
