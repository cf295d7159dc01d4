use crate::cache::CacheBackend;
use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, warn};
use serde::Serialize;
use utoipa::ToSchema;

/// Represents the health status of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum HealthStatusType {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "error")]
    Error,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub status_code: StatusCode,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: HealthStatusType::Ok,
            error: None,
            status_code: StatusCode::OK,
        }
    }

    fn error(error: String) -> Self {
        Self {
            status: HealthStatusType::Error,
            error: Some(error),
            status_code: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = self.status_code;
        (status_code, Json(self)).into_response()
    }
}

/// Liveness probe. Answers ok as long as the process serves requests.
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub(crate) async fn health_check() -> HealthResponse {
    debug!("Health check passed");
    HealthResponse::ok()
}

/// Readiness probe. Verifies the cache backend answers.
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "A dependency is unavailable", body = HealthResponse)
    )
)]
pub(crate) async fn ready_check(State(state): State<AppState>) -> HealthResponse {
    match state.cache.health_check().await {
        Ok(()) => {
            debug!("Readiness check passed");
            HealthResponse::ok()
        }
        Err(e) => {
            warn!("Readiness check failed: {e}");
            HealthResponse::error(format!("cache: {e}"))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}
