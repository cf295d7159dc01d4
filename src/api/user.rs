use crate::api::oauth::bridge::BridgeError;
use crate::cache::CacheBackend;
use crate::errors::ApiError;
use crate::headers::{presets, ClientCacheControl};
use crate::openapi::GITHUB_TAG;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, error, warn};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Creates routes proxying the authorized user's GitHub data
pub fn router() -> Router<AppState> {
    Router::new().route("/user", get(user_profile))
}

/// Rejects requests that do not carry a live bearer token minted by this
/// server.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::unauthorized("Missing bearer token").into_response();
    };
    let Some(stored) = state.bridge.validate_token(token).await else {
        debug!("Rejected request with unknown or expired bearer token");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    };

    debug!(
        "Authenticated client '{}' with scopes {:?}",
        stored.client_id, stored.scopes
    );
    next.run(request).await
}

/// Fetches the GitHub profile behind the caller's bearer token.
///
/// Profiles are cached briefly, keyed by a digest of the GitHub token so
/// the token itself never appears in cache keys or logs.
#[utoipa::path(
    get,
    path = "/user",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by this server"),
        ("Cache-Control" = Option<String>, Header, description = "no-cache bypasses the profile cache, no-store also skips storing")
    ),
    responses(
        (status = 200, description = "GitHub profile of the authorized user"),
        (status = 400, description = "Token has no linked GitHub token"),
        (status = 401, description = "Missing, invalid, or expired bearer token"),
        (status = 502, description = "GitHub API failure")
    ),
    tag = GITHUB_TAG
)]
pub async fn user_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // The middleware has already vetted the token; re-parse to stay total.
    let Some(token) = bearer_token(&headers) else {
        return ApiError::unauthorized("Missing bearer token").into_response();
    };

    let github_token = match state.bridge.resolve_upstream_token(token).await {
        Ok(github_token) => github_token,
        Err(e @ (BridgeError::InvalidToken | BridgeError::TokenExpired)) => {
            return ApiError::unauthorized(e.to_string()).into_response();
        }
        Err(e @ BridgeError::NoLinkedUpstreamToken) => {
            return ApiError::bad_request(e.to_string()).into_response();
        }
        Err(e) => {
            error!("Failed to resolve GitHub token: {e}");
            return ApiError::internal("Failed to resolve GitHub token").into_response();
        }
    };

    let cache_control = ClientCacheControl::from_header_value(headers.get(header::CACHE_CONTROL));
    let cache_key = profile_cache_key(&github_token);

    if cache_control.should_use_cache() {
        match state.cache.get::<Value>(&cache_key).await {
            Ok(Some(profile)) => {
                debug!("Cache hit for key: {cache_key}");
                return profile_response(&state, profile);
            }
            Ok(None) => debug!("Cache miss for key: {cache_key}"),
            Err(e) => warn!("Cache error for key {cache_key}: {e}"),
        }
    } else {
        debug!("Skipping cache lookup due to cache control directives: {cache_control:?}");
    }

    let profile = match state.github.fetch_user(&github_token).await {
        Ok(profile) => profile,
        Err(e) => {
            error!("GitHub user lookup failed: {e}");
            return ApiError::bad_gateway(format!("GitHub API error: {e}")).into_response();
        }
    };

    if cache_control.no_store {
        debug!("Skipping cache storage due to no-store directive");
    } else if let Err(e) = state.cache.set(&cache_key, &profile).await {
        warn!("Failed to cache result for {cache_key}: {e}");
    }

    profile_response(&state, profile)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub(crate) fn profile_cache_key(github_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(github_token.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("github:profile:{}", &hash[..16])
}

fn profile_response(state: &AppState, profile: Value) -> Response {
    let mut response = Json(profile).into_response();
    presets::private_cache(state.settings.cache.ttl_secs).apply(&mut response);
    response
}
