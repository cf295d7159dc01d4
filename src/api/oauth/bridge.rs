use super::github::{GithubClient, GithubError};
use super::models::{
    PendingAuthorization, StoredAccessToken, StoredAuthorizationCode, TokenResponse,
};
use super::random_hex;
use super::registry::ClientRegistry;
use crate::config::OAuthConfig;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Prefix namespacing codes and tokens minted by this server, telling them
/// apart from GitHub's own token strings.
pub const LOCAL_TOKEN_PREFIX: &str = "mcp_";

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unknown client '{0}'")]
    UnknownClient(String),

    #[error("redirect_uri is not registered for this client")]
    RedirectUriNotRegistered,

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Failed to exchange code for token")]
    UpstreamExchangeFailed(#[source] GithubError),

    /// GitHub refused the authorization; carries GitHub's description.
    #[error("{0}")]
    UpstreamRejected(String),

    #[error("Invalid authorization code")]
    InvalidCode,

    #[error("Invalid MCP token")]
    InvalidToken,

    #[error("MCP token expired")]
    TokenExpired,

    #[error("No GitHub token found for user")]
    NoLinkedUpstreamToken,

    #[error("Invalid redirect URI: {0}")]
    InvalidRedirectUri(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("System time error: {0}")]
    Clock(String),
}

/// In-memory tables of the authorization state machine.
///
/// All four live behind one lock so multi-table steps stay atomic: the
/// callback mints a code and stores the GitHub token in one critical
/// section, and code exchange consumes the code and mints the token in
/// another.
#[derive(Default)]
struct Tables {
    /// Flows awaiting the GitHub callback, keyed by `state`
    pending: HashMap<String, PendingAuthorization>,
    /// Locally minted authorization codes awaiting exchange
    codes: HashMap<String, StoredAuthorizationCode>,
    /// Local and upstream access tokens, keyed by the token string
    tokens: HashMap<String, StoredAccessToken>,
    /// Local token to the GitHub token backing it
    links: HashMap<String, String>,
}

enum TokenLookup {
    Live(StoredAccessToken),
    Expired,
    Missing,
}

impl Tables {
    /// Single expiry gate for token reads. Expired entries are evicted
    /// together with their link on access; there is no background sweep.
    fn get_token_if_valid(&mut self, token: &str, now: u64) -> TokenLookup {
        let Some(stored) = self.tokens.get(token) else {
            return TokenLookup::Missing;
        };
        if stored.expires_at.is_some_and(|expires_at| now >= expires_at) {
            self.tokens.remove(token);
            self.links.remove(token);
            return TokenLookup::Expired;
        }
        TokenLookup::Live(stored.clone())
    }
}

fn unix_now() -> Result<u64, BridgeError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|e| BridgeError::Clock(e.to_string()))
}

fn is_github_token(token: &str) -> bool {
    // GitHub mints ghu_ or gho_ user tokens depending on app type.
    token.starts_with("ghu_") || token.starts_with("gho_")
}

/// OAuth state machine bridging MCP clients to GitHub.
///
/// Clients never see GitHub credentials: the bridge swaps GitHub's code
/// for a GitHub token server-side, hands the client a local `mcp_` code,
/// and later a local `mcp_` token linked to the stored GitHub token.
pub struct AuthBridge {
    registry: Arc<ClientRegistry>,
    github: GithubClient,
    local_scope: String,
    code_ttl_secs: u64,
    token_ttl_secs: u64,
    tables: RwLock<Tables>,
}

impl AuthBridge {
    pub fn new(github: GithubClient, registry: Arc<ClientRegistry>, config: &OAuthConfig) -> Self {
        Self {
            registry,
            github,
            local_scope: config.scope.clone(),
            code_ttl_secs: config.code_ttl_secs,
            token_ttl_secs: config.token_ttl_secs,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Start an authorization flow: validate the client, record a pending
    /// flow keyed by `state`, and return the GitHub redirect URL.
    ///
    /// A missing `state` is replaced by a 128-bit random value. The same
    /// `state` is forwarded to GitHub so the callback can be correlated
    /// without a second mapping table.
    pub async fn begin_authorization(
        &self,
        client_id: &str,
        redirect_uri: Option<&str>,
        state: Option<String>,
        code_challenge: Option<String>,
        scope: Option<&str>,
    ) -> Result<Url, BridgeError> {
        let client = self
            .registry
            .lookup(client_id)
            .await
            .ok_or_else(|| BridgeError::UnknownClient(client_id.to_string()))?;

        let (redirect_uri, redirect_uri_provided) = match redirect_uri {
            Some(uri) => {
                if !client.redirect_uris.iter().any(|registered| registered == uri) {
                    return Err(BridgeError::RedirectUriNotRegistered);
                }
                (uri.to_string(), true)
            }
            None => {
                let first = client
                    .redirect_uris
                    .first()
                    .cloned()
                    .ok_or(BridgeError::RedirectUriNotRegistered)?;
                (first, false)
            }
        };

        let state = state.unwrap_or_else(|| random_hex(16));
        let authorize_url = self
            .github
            .authorization_url(&state)
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;

        let mut tables = self.tables.write().await;
        tables.pending.insert(
            state,
            PendingAuthorization {
                client_id: client.client_id.clone(),
                redirect_uri,
                code_challenge,
                redirect_uri_provided,
            },
        );
        drop(tables);

        info!(
            "Authorization started for client '{}' (requested scope: {})",
            client.client_id,
            scope.unwrap_or("none")
        );
        Ok(authorize_url)
    }

    /// Complete the GitHub leg of the flow: exchange GitHub's code, mint a
    /// local authorization code, and build the redirect back to the client.
    ///
    /// The pending entry is consumed only after GitHub accepts the
    /// exchange; a failed exchange leaves it in place so the flow can be
    /// retried with the same `state`.
    pub async fn handle_provider_callback(
        &self,
        code: &str,
        state: &str,
    ) -> Result<Url, BridgeError> {
        // Fail fast on unknown state before going to the network.
        if !self.tables.read().await.pending.contains_key(state) {
            return Err(BridgeError::InvalidState);
        }

        // No table lock may be held across this call.
        let github_token = self.github.exchange_code(code).await.map_err(|e| match e {
            GithubError::Rejected(description) => {
                warn!("GitHub rejected the code exchange: {description}");
                BridgeError::UpstreamRejected(description)
            }
            other => {
                error!("GitHub code exchange failed: {other}");
                BridgeError::UpstreamExchangeFailed(other)
            }
        })?;

        let now = unix_now()?;
        let local_code = format!("{LOCAL_TOKEN_PREFIX}{}", random_hex(16));

        let mut tables = self.tables.write().await;
        // Concurrent callbacks race for the same state; exactly one may
        // consume it.
        let Some(pending) = tables.pending.remove(state) else {
            return Err(BridgeError::InvalidState);
        };
        tables.codes.insert(
            local_code.clone(),
            StoredAuthorizationCode {
                client_id: pending.client_id.clone(),
                redirect_uri: pending.redirect_uri.clone(),
                redirect_uri_provided: pending.redirect_uri_provided,
                scopes: vec![self.local_scope.clone()],
                code_challenge: pending.code_challenge.clone(),
                expires_at: now + self.code_ttl_secs,
            },
        );
        // The GitHub token is keyed by its own string and carries no local
        // expiry; it becomes resolvable once a local token links to it.
        tables.tokens.insert(
            github_token,
            StoredAccessToken {
                client_id: pending.client_id.clone(),
                scopes: vec![self.github.scope().to_string()],
                expires_at: None,
            },
        );
        drop(tables);

        info!("Authorization code issued for client '{}'", pending.client_id);

        let mut redirect = Url::parse(&pending.redirect_uri)
            .map_err(|_| BridgeError::InvalidRedirectUri(pending.redirect_uri.clone()))?;
        redirect
            .query_pairs_mut()
            .append_pair("code", &local_code)
            .append_pair("state", state);
        Ok(redirect)
    }

    /// Exchange a local authorization code for a local access token,
    /// linking it to the client's stored GitHub token when one exists.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        code: &str,
    ) -> Result<TokenResponse, BridgeError> {
        let now = unix_now()?;
        let token = format!("{LOCAL_TOKEN_PREFIX}{}", random_hex(32));

        let mut tables = self.tables.write().await;
        // Single atomic take: of two concurrent exchanges of one code, the
        // loser sees InvalidCode.
        let Some(stored) = tables.codes.remove(code) else {
            return Err(BridgeError::InvalidCode);
        };
        if now >= stored.expires_at {
            debug!("Authorization code expired {}s ago", now - stored.expires_at);
            return Err(BridgeError::InvalidCode);
        }
        if stored.client_id != client_id {
            warn!(
                "Code issued to client '{}' exchanged by client '{}'",
                stored.client_id, client_id
            );
        }
        debug!(
            "Consuming code bound to redirect '{}' (explicit: {}, PKCE challenge: {})",
            stored.redirect_uri,
            stored.redirect_uri_provided,
            if stored.code_challenge.is_some() {
                "present"
            } else {
                "absent"
            }
        );

        tables.tokens.insert(
            token.clone(),
            StoredAccessToken {
                client_id: client_id.to_string(),
                scopes: stored.scopes.clone(),
                expires_at: Some(now + self.token_ttl_secs),
            },
        );

        let github_token = tables
            .tokens
            .iter()
            .find(|(candidate, record)| {
                is_github_token(candidate) && record.client_id == client_id
            })
            .map(|(candidate, _)| candidate.clone());
        match github_token {
            Some(github_token) => {
                tables.links.insert(token.clone(), github_token);
            }
            None => warn!(
                "No GitHub token stored for client '{}'; the new token will not resolve upstream",
                client_id
            ),
        }
        drop(tables);

        info!("Access token issued to client '{}'", client_id);
        Ok(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            expires_in: self.token_ttl_secs,
            scope: stored.scopes.join(" "),
        })
    }

    /// Look up a token, evicting it first if it has expired.
    pub async fn validate_token(&self, token: &str) -> Option<StoredAccessToken> {
        let now = match unix_now() {
            Ok(now) => now,
            Err(e) => {
                warn!("Token validation failed: {e}");
                return None;
            }
        };
        let mut tables = self.tables.write().await;
        match tables.get_token_if_valid(token, now) {
            TokenLookup::Live(stored) => Some(stored),
            TokenLookup::Expired => {
                debug!("Evicted expired access token");
                None
            }
            TokenLookup::Missing => None,
        }
    }

    /// Remove a token and its upstream link. Revoking an unknown token is
    /// not an error.
    pub async fn revoke_token(&self, token: &str) {
        let mut tables = self.tables.write().await;
        let removed = tables.tokens.remove(token).is_some();
        tables.links.remove(token);
        if removed {
            info!("Access token revoked");
        }
    }

    /// Map a live local token to the GitHub token backing it.
    pub async fn resolve_upstream_token(&self, token: &str) -> Result<String, BridgeError> {
        let now = unix_now()?;
        let mut tables = self.tables.write().await;
        match tables.get_token_if_valid(token, now) {
            TokenLookup::Missing => Err(BridgeError::InvalidToken),
            TokenLookup::Expired => Err(BridgeError::TokenExpired),
            TokenLookup::Live(_) => tables
                .links
                .get(token)
                .cloned()
                .ok_or(BridgeError::NoLinkedUpstreamToken),
        }
    }
}
