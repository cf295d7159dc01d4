//! OAuth 2.0 endpoint handlers

use crate::api::oauth::{
    bridge::BridgeError,
    models::{
        AuthorizationRequest, AuthorizationServerMetadata, CallbackRequest, ClientRecord,
        ClientRegistrationRequest, OAuthError, RevocationRequest, TokenRequest, TokenResponse,
    },
};
use crate::cache::CacheBackend;
use crate::headers::presets;
use crate::openapi::{GITHUB_TAG, OAUTH_TAG};
use crate::state::AppState;
use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info, warn};
use url::Url;

/// OAuth 2.0 authorization endpoint (RFC 6749 section 4.1.1).
/// Validates the client and redirects the user agent to GitHub.
#[utoipa::path(
    get,
    path = "/authorize",
    params(
        ("response_type" = Option<String>, Query, description = "Must be 'code' when present"),
        ("client_id" = String, Query, description = "Id of a registered client"),
        ("redirect_uri" = Option<String>, Query, description = "Registered redirect URI; defaults to the client's first registered URI"),
        ("scope" = Option<String>, Query, description = "Requested scopes"),
        ("state" = Option<String>, Query, description = "CSRF token, generated server-side when absent"),
        ("code_challenge" = Option<String>, Query, description = "PKCE code challenge"),
        ("code_challenge_method" = Option<String>, Query, description = "PKCE method; only S256 is advertised")
    ),
    responses(
        (status = 302, description = "Redirect to GitHub's authorization page"),
        (status = 400, description = "Invalid request", body = OAuthError),
        (status = 500, description = "Internal server error", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn authorize(
    State(state): State<AppState>,
    Query(request): Query<AuthorizationRequest>,
) -> Response {
    let Some(client_id) = request.client_id else {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Missing client_id"),
        );
    };
    info!("Authorization request from client '{client_id}'");

    if request.response_type.as_deref().is_some_and(|value| value != "code") {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::unsupported_response_type("Only response_type=code is supported"),
        );
    }
    if let Some(method) = request.code_challenge_method.as_deref() {
        debug!("PKCE challenge method requested: {method}");
    }

    match state
        .bridge
        .begin_authorization(
            &client_id,
            request.redirect_uri.as_deref(),
            request.state,
            request.code_challenge,
            request.scope.as_deref(),
        )
        .await
    {
        Ok(url) => redirect_found(&url),
        Err(BridgeError::UnknownClient(_)) => error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_client("Invalid client_id"),
        ),
        Err(e @ BridgeError::RedirectUriNotRegistered) => error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request(&e.to_string()),
        ),
        Err(e) => {
            error!("Failed to start authorization: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Unexpected error"),
            )
        }
    }
}

/// Callback GitHub redirects to after the user approves or denies access.
/// Swaps GitHub's code for a GitHub token and sends the user back to the
/// client with a locally minted code.
#[utoipa::path(
    get,
    path = "/github/callback",
    params(
        ("code" = String, Query, description = "Authorization code issued by GitHub"),
        ("state" = String, Query, description = "State from the original authorization request")
    ),
    responses(
        (status = 302, description = "Redirect back to the client with an authorization code"),
        (status = 400, description = "Unknown state or rejected code", body = OAuthError),
        (status = 500, description = "Internal server error", body = OAuthError)
    ),
    tag = GITHUB_TAG
)]
pub async fn github_callback(
    State(state): State<AppState>,
    Query(request): Query<CallbackRequest>,
) -> Response {
    let (Some(code), Some(flow_state)) = (request.code, request.state) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Missing code or state parameter"),
        );
    };

    match state
        .bridge
        .handle_provider_callback(&code, &flow_state)
        .await
    {
        Ok(url) => redirect_found(&url),
        Err(e @ BridgeError::InvalidState) => error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request(&e.to_string()),
        ),
        Err(
            e @ (BridgeError::UpstreamRejected(_) | BridgeError::UpstreamExchangeFailed(_)),
        ) => error_response(StatusCode::BAD_REQUEST, OAuthError::invalid_grant(&e.to_string())),
        Err(e) => {
            error!("Callback processing failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Unexpected error"),
            )
        }
    }
}

/// OAuth 2.0 token endpoint (RFC 6749 section 4.1.3).
/// Exchanges a locally minted authorization code for an access token.
#[utoipa::path(
    post,
    path = "/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = OAuthError),
        (status = 500, description = "Internal server error", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn token(State(state): State<AppState>, Form(request): Form<TokenRequest>) -> Response {
    // RFC 6749 section 5.1 forbids caching token responses.
    let mut response = exchange_token(state, request).await;
    presets::no_store().apply(&mut response);
    response
}

async fn exchange_token(state: AppState, request: TokenRequest) -> Response {
    match request.grant_type.as_deref() {
        Some("authorization_code") => {}
        other => {
            warn!("Unsupported grant type: {other:?}");
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::unsupported_grant_type("Unsupported grant type"),
            );
        }
    }

    let (Some(code), Some(client_id)) = (request.code, request.client_id) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Missing required parameters"),
        );
    };
    info!("Token request from client '{client_id}'");

    if state.registry.lookup(&client_id).await.is_none() {
        warn!("Token request from unknown client '{client_id}'");
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_client("Invalid client"),
        );
    }
    if request.client_secret.is_some() {
        debug!("Client '{client_id}' authenticated with client_secret_post");
    }
    if let Some(redirect_uri) = request.redirect_uri.as_deref() {
        debug!("Token request carries redirect_uri '{redirect_uri}'");
    }
    if request.code_verifier.is_some() {
        debug!("PKCE verifier supplied; verification is not performed");
    }

    match state.bridge.exchange_code(&client_id, &code).await {
        Ok(token_response) => Json(token_response).into_response(),
        Err(e @ BridgeError::InvalidCode) => error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_grant(&e.to_string()),
        ),
        Err(e) => {
            error!("Token issuance failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to issue access token"),
            )
        }
    }
}

/// Dynamic client registration endpoint (RFC 7591).
/// Registration is an upsert: posting an existing client_id replaces the
/// stored record.
#[utoipa::path(
    post,
    path = "/register",
    request_body = ClientRegistrationRequest,
    responses(
        (status = 201, description = "Client registered", body = ClientRecord),
        (status = 400, description = "Invalid client metadata", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<ClientRegistrationRequest>,
) -> Response {
    match state.registry.register(request).await {
        Ok(record) => {
            info!("Registered client '{}'", record.client_id);
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => {
            warn!("Client registration rejected: {e}");
            error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_client_metadata(&e.to_string()),
            )
        }
    }
}

/// Token revocation endpoint (RFC 7009).
/// Answers 200 whether or not the token was known.
#[utoipa::path(
    post,
    path = "/revoke",
    request_body(content = RevocationRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token revoked or already unknown"),
        (status = 400, description = "Missing token parameter", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn revoke(
    State(state): State<AppState>,
    Form(request): Form<RevocationRequest>,
) -> Response {
    let Some(token) = request.token else {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("token parameter is required"),
        );
    };
    if let Some(hint) = request.token_type_hint.as_deref() {
        debug!("Revocation hint: {hint}");
    }

    // Drop the cached profile while the upstream link still exists.
    if let Ok(github_token) = state.bridge.resolve_upstream_token(&token).await {
        let cache_key = crate::api::user::profile_cache_key(&github_token);
        if let Err(e) = state.cache.delete(&cache_key).await {
            warn!("Failed to evict cached profile for revoked token: {e}");
        }
    }

    state.bridge.revoke_token(&token).await;
    StatusCode::OK.into_response()
}

/// Authorization server metadata document (RFC 8414).
#[utoipa::path(
    get,
    path = "/.well-known/oauth-authorization-server",
    responses(
        (status = 200, description = "Server metadata", body = AuthorizationServerMetadata)
    ),
    tag = OAUTH_TAG
)]
pub async fn discovery(State(state): State<AppState>) -> Json<AuthorizationServerMetadata> {
    Json(AuthorizationServerMetadata::from_settings(&state.settings))
}

/// Build a 302 redirect. `Redirect::to` answers 303; OAuth redirects use
/// 302 Found.
fn redirect_found(url: &Url) -> Response {
    match HeaderValue::from_str(url.as_str()) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            error!("Redirect URL is not a valid header value: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Unexpected error"),
            )
        }
    }
}

/// Helper function to create error responses
fn error_response(status: StatusCode, error: OAuthError) -> Response {
    (status, Json(error)).into_response()
}
