mod cache;
mod github;
mod oauth;

pub use cache::{CacheConfig, CacheStore};
pub use github::GithubConfig;
pub use oauth::OAuthConfig;

use confique::Config;

/// Environment variable pointing at an optional TOML config file.
const CONFIG_FILE_ENV: &str = "BRIDGE_CONFIG";

/// Top-level configuration for the bridge server.
///
/// Values are resolved in order: environment variables, then the TOML file
/// named by `BRIDGE_CONFIG` (if set), then built-in defaults.
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// Host the HTTP server binds to
    #[config(env = "BRIDGE_HOST", default = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server listens on
    #[config(env = "BRIDGE_PORT", default = 9090)]
    pub port: u16,

    /// Public base URL of this server, used to build the discovery document
    #[config(env = "BRIDGE_URL", default = "http://localhost:9090")]
    pub url: String,

    /// GitHub OAuth app and API settings
    #[config(nested)]
    pub github: GithubConfig,

    /// Local token issuance and client registration settings
    #[config(nested)]
    pub oauth: OAuthConfig,

    /// GitHub profile cache settings
    #[config(nested)]
    pub cache: CacheConfig,
}

impl Settings {
    /// Load settings from the environment and the optional config file.
    pub fn load() -> Result<Self, confique::Error> {
        let mut builder = Self::builder().env();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.file(path);
        }
        builder.load()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
            url: "http://localhost:9090".to_string(),
            github: GithubConfig::default(),
            oauth: OAuthConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
impl Settings {
    /// Settings wired to a wiremock server standing in for GitHub.
    pub fn for_test_with_mocks(github_mock: &wiremock::MockServer) -> Self {
        let mut settings = Settings::default();
        settings.github.client_id = "test-github-app".to_string();
        settings.github.client_secret = "test-github-secret".to_string();
        settings.github.auth_url = format!("{}/login/oauth/authorize", github_mock.uri());
        settings.github.token_url = format!("{}/login/oauth/access_token", github_mock.uri());
        settings.github.api_url = github_mock.uri();
        settings
    }
}
