use crate::config::Settings;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters for `GET /authorize`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizationRequest {
    /// Must be `code` when present
    pub response_type: Option<String>,
    /// Id of a registered client
    pub client_id: Option<String>,
    /// Where to send the user after authorization; must be registered for
    /// the client. Falls back to the client's first registered URI.
    pub redirect_uri: Option<String>,
    /// Scopes requested by the client
    pub scope: Option<String>,
    /// Opaque CSRF token; generated server-side when absent
    pub state: Option<String>,
    /// PKCE challenge, carried through the flow unmodified
    pub code_challenge: Option<String>,
    /// PKCE method; only S256 is advertised
    pub code_challenge_method: Option<String>,
}

/// Query parameters GitHub sends to the callback endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CallbackRequest {
    /// Authorization code issued by GitHub
    pub code: Option<String>,
    /// State value from the original authorization request
    pub state: Option<String>,
}

/// Form fields for `POST /token`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Must be `authorization_code`
    pub grant_type: Option<String>,
    /// Authorization code issued by this server
    pub code: Option<String>,
    /// Id of the client performing the exchange
    pub client_id: Option<String>,
    /// Accepted but not required; clients registered with auth method
    /// `none` send no secret
    pub client_secret: Option<String>,
    /// Accepted for compatibility with RFC 6749 clients
    pub redirect_uri: Option<String>,
    /// PKCE verifier, accepted for compatibility but not verified
    pub code_verifier: Option<String>,
}

/// Form fields for `POST /revoke`, per RFC 7009.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevocationRequest {
    /// Token to revoke
    pub token: Option<String>,
    /// Hint about the token type, accepted and ignored
    pub token_type_hint: Option<String>,
}

/// Client metadata submitted to `POST /register`, per RFC 7591.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClientRegistrationRequest {
    /// Client id to upsert; a fresh id is generated when absent
    pub client_id: Option<String>,
    /// Redirection URIs; at least one is required
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    pub grant_types: Option<Vec<String>>,
    pub response_types: Option<Vec<String>>,
    pub token_endpoint_auth_method: Option<String>,
    /// Space-separated scopes; validated against the configured scope list
    pub scope: Option<String>,
    pub client_name: Option<String>,
}

/// Registered client metadata as stored and returned by registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientRecord {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Unix timestamp of registration
    pub client_id_issued_at: i64,
}

/// Successful token response, per RFC 6749 section 5.1.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    /// Space-joined granted scopes
    pub scope: String,
}

/// OAuth error body, per RFC 6749 section 5.2.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthError {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthError {
    fn new(error: &str, description: &str) -> Self {
        Self {
            error: error.to_string(),
            error_description: Some(description.to_string()),
        }
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new("invalid_request", description)
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new("invalid_client", description)
    }

    pub fn invalid_grant(description: &str) -> Self {
        Self::new("invalid_grant", description)
    }

    pub fn unsupported_grant_type(description: &str) -> Self {
        Self::new("unsupported_grant_type", description)
    }

    pub fn unsupported_response_type(description: &str) -> Self {
        Self::new("unsupported_response_type", description)
    }

    pub fn invalid_client_metadata(description: &str) -> Self {
        Self::new("invalid_client_metadata", description)
    }

    pub fn server_error(description: &str) -> Self {
        Self::new("server_error", description)
    }
}

/// Discovery document served at `/.well-known/oauth-authorization-server`,
/// per RFC 8414.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
    pub revocation_endpoint: String,
    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}

impl AuthorizationServerMetadata {
    pub fn from_settings(settings: &Settings) -> Self {
        let base_url = settings.url.trim_end_matches('/');
        Self {
            issuer: format!("{base_url}/"),
            authorization_endpoint: format!("{base_url}/authorize"),
            token_endpoint: format!("{base_url}/token"),
            registration_endpoint: format!("{base_url}/register"),
            revocation_endpoint: format!("{base_url}/revoke"),
            scopes_supported: settings.oauth.valid_scopes.clone(),
            response_types_supported: vec!["code".to_string()],
            // Refresh tokens are not implemented, so only the code grant
            // is advertised.
            grant_types_supported: vec!["authorization_code".to_string()],
            token_endpoint_auth_methods_supported: vec!["client_secret_post".to_string()],
            code_challenge_methods_supported: vec!["S256".to_string()],
        }
    }
}

/// GitHub's reply to an authorization code exchange.
///
/// GitHub answers HTTP 200 for rejected codes and signals the failure
/// through the `error` field instead.
#[derive(Debug, Deserialize)]
pub struct GithubTokenResponse {
    pub access_token: Option<String>,
    #[allow(dead_code)]
    pub token_type: Option<String>,
    #[allow(dead_code)]
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Authorization flow awaiting the provider callback, keyed by `state`.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: Option<String>,
    pub redirect_uri_provided: bool,
}

/// Locally minted authorization code, single-use, short-lived.
#[derive(Debug, Clone)]
pub struct StoredAuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub redirect_uri_provided: bool,
    pub scopes: Vec<String>,
    pub code_challenge: Option<String>,
    /// Unix timestamp after which the code is dead
    pub expires_at: u64,
}

/// Access token entry. Holds both locally minted tokens and upstream
/// GitHub tokens; upstream entries have no local expiry.
#[derive(Debug, Clone)]
pub struct StoredAccessToken {
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Unix timestamp after which the token is dead; `None` never expires
    pub expires_at: Option<u64>,
}
