use confique::Config;

/// Local token issuance and client registration configuration.
#[derive(Debug, Config, Clone)]
pub struct OAuthConfig {
    /// Scope stamped on locally issued access tokens
    #[config(env = "BRIDGE_OAUTH_SCOPE", default = "claudeai")]
    pub scope: String,

    /// Lifetime of authorization codes, in seconds
    #[config(env = "BRIDGE_OAUTH_CODE_TTL_SECS", default = 300)]
    pub code_ttl_secs: u64,

    /// Lifetime of access tokens, in seconds
    #[config(env = "BRIDGE_OAUTH_TOKEN_TTL_SECS", default = 3600)]
    pub token_ttl_secs: u64,

    /// Scopes clients may request at registration
    #[config(default = ["user", "claudeai"])]
    pub valid_scopes: Vec<String>,

    /// Scope granted when a registering client requests none
    #[config(env = "BRIDGE_OAUTH_DEFAULT_SCOPE", default = "user")]
    pub default_scope: String,

    /// Client id pre-registered at startup
    #[config(
        env = "BRIDGE_OAUTH_SEED_CLIENT_ID",
        default = "91be729f-30be-4614-b93f-f2b4a7ec8a98"
    )]
    pub seed_client_id: String,

    /// Display name of the pre-registered client
    #[config(env = "BRIDGE_OAUTH_SEED_CLIENT_NAME", default = "claudeai")]
    pub seed_client_name: String,

    /// Redirect URI of the pre-registered client
    #[config(
        env = "BRIDGE_OAUTH_SEED_REDIRECT_URI",
        default = "https://claude.ai/api/mcp/auth_callback"
    )]
    pub seed_redirect_uri: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            scope: "claudeai".to_string(),
            code_ttl_secs: 300,
            token_ttl_secs: 3600,
            valid_scopes: vec!["user".to_string(), "claudeai".to_string()],
            default_scope: "user".to_string(),
            seed_client_id: "91be729f-30be-4614-b93f-f2b4a7ec8a98".to_string(),
            seed_client_name: "claudeai".to_string(),
            seed_redirect_uri: "https://claude.ai/api/mcp/auth_callback".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_config_defaults() {
        let config = OAuthConfig::default();
        assert_eq!(config.scope, "claudeai");
        assert_eq!(config.code_ttl_secs, 300);
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.valid_scopes, vec!["user", "claudeai"]);
        assert_eq!(config.default_scope, "user");
        assert_eq!(config.seed_client_id, "91be729f-30be-4614-b93f-f2b4a7ec8a98");
        assert_eq!(config.seed_redirect_uri, "https://claude.ai/api/mcp/auth_callback");
    }
}
