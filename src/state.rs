use crate::api::oauth::{bridge::AuthBridge, github::GithubClient, registry::ClientRegistry};
use crate::cache::{create_cache, Cache};
use crate::config::Settings;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<ClientRegistry>,
    pub bridge: Arc<AuthBridge>,
    pub github: GithubClient,
    pub cache: Arc<Cache>,
}

impl AppState {
    fn create_github_http_client(timeout_secs: u64) -> Result<Client, std::io::Error> {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(2))
            // GitHub rejects API requests without a User-Agent
            .user_agent(concat!("mcp-auth-bridge/", env!("CARGO_PKG_VERSION")))
            // Configure connection pool
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create GitHub client: {}", e),
                )
            })
    }

    pub fn new(settings: Settings) -> Result<Self, std::io::Error> {
        let http_client = Self::create_github_http_client(settings.github.timeout_secs)?;
        let github = GithubClient::new(http_client, settings.github.clone());
        let registry = Arc::new(ClientRegistry::from_settings(&settings.oauth));
        let bridge = Arc::new(AuthBridge::new(
            github.clone(),
            registry.clone(),
            &settings.oauth,
        ));
        let cache = Arc::new(create_cache(&settings));

        Ok(Self {
            settings: Arc::new(settings),
            registry,
            bridge,
            github,
            cache,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_testing(settings: &Settings) -> Self {
        Self::new(settings.clone()).expect("Failed to build test state")
    }
}
