//! OAuth 2.0 authorization server bridging MCP clients to GitHub
//!
//! MCP clients run a standard authorization code flow against this server
//! while the actual identity provider is GitHub. GitHub credentials never
//! reach the client: the GitHub token is swapped server-side for a locally
//! minted `mcp_` token that stays linked to it.
//!
//! ## Supported OAuth 2.0 endpoints
//! - Authorization Code Grant (RFC 6749 Section 4.1)
//! - Dynamic Client Registration (RFC 7591)
//! - Token Revocation (RFC 7009)
//! - Authorization Server Metadata (RFC 8414)
//!
//! ## Architecture
//! - All flow state lives in process memory; a restart voids every flow
//! - Codes and tokens are opaque random strings, not JWTs
//! - PKCE parameters are accepted and carried through but not verified

pub mod bridge;
pub mod github;
pub mod handlers;
pub mod models;
pub mod registry;

use crate::state::AppState;
use axum::routing::{get, post, Router};
use rand::RngCore;

/// Creates OAuth 2.0 routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/authorize", get(handlers::authorize))
        .route("/github/callback", get(handlers::github_callback))
        .route("/token", post(handlers::token))
        .route("/register", post(handlers::register))
        .route("/revoke", post(handlers::revoke))
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::discovery),
        )
}

/// Hex-encoded random bytes from the thread-local CSPRNG.
pub(crate) fn random_hex(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
