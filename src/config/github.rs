use confique::Config;

/// GitHub OAuth app credentials and endpoint URLs.
///
/// `client_id` and `client_secret` have no defaults and must be provided
/// through the environment (or the config file) for `Settings::load` to
/// succeed.
#[derive(Debug, Config, Clone)]
pub struct GithubConfig {
    /// OAuth app client id
    #[config(env = "BRIDGE_GITHUB_CLIENT_ID")]
    pub client_id: String,

    /// OAuth app client secret
    #[config(env = "BRIDGE_GITHUB_CLIENT_SECRET")]
    pub client_secret: String,

    /// Authorization endpoint users are redirected to
    #[config(
        env = "BRIDGE_GITHUB_AUTH_URL",
        default = "https://github.com/login/oauth/authorize"
    )]
    pub auth_url: String,

    /// Endpoint the bridge exchanges authorization codes against
    #[config(
        env = "BRIDGE_GITHUB_TOKEN_URL",
        default = "https://github.com/login/oauth/access_token"
    )]
    pub token_url: String,

    /// Base URL of the GitHub REST API
    #[config(env = "BRIDGE_GITHUB_API_URL", default = "https://api.github.com")]
    pub api_url: String,

    /// Public URL GitHub redirects back to after user consent
    #[config(
        env = "BRIDGE_GITHUB_CALLBACK_URL",
        default = "http://localhost:9090/github/callback"
    )]
    pub callback_url: String,

    /// Scope requested from GitHub during authorization
    #[config(env = "BRIDGE_GITHUB_SCOPE", default = "read:user")]
    pub scope: String,

    /// Request timeout for calls to GitHub, in seconds
    #[config(env = "BRIDGE_GITHUB_TIMEOUT_SECS", default = 10)]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            api_url: "https://api.github.com".to_string(),
            callback_url: "http://localhost:9090/github/callback".to_string(),
            scope: "read:user".to_string(),
            timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_config_defaults() {
        let config = GithubConfig::default();
        assert!(config.client_id.is_empty());
        assert!(config.client_secret.is_empty());
        assert_eq!(config.auth_url, "https://github.com/login/oauth/authorize");
        assert_eq!(
            config.token_url,
            "https://github.com/login/oauth/access_token"
        );
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.callback_url, "http://localhost:9090/github/callback");
        assert_eq!(config.scope, "read:user");
        assert_eq!(config.timeout_secs, 10);
    }
}
