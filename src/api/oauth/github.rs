use super::models::GithubTokenResponse;
use crate::config::GithubConfig;
use http::header::ACCEPT;
use log::{debug, error};
use reqwest::Client;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned HTTP {0}")]
    Status(u16),

    /// GitHub answered 200 but rejected the request through the `error`
    /// field. Carries the provider's own description.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),

    #[error("Invalid GitHub URL: {0}")]
    Config(String),
}

/// Client for the GitHub endpoints the bridge talks to: the OAuth
/// authorize/token pair and the REST user endpoint.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(client: Client, config: GithubConfig) -> Self {
        Self { client, config }
    }

    /// Scope requested from GitHub during authorization.
    pub fn scope(&self) -> &str {
        &self.config.scope
    }

    /// Build the authorization URL a user is redirected to, carrying the
    /// bridge's callback URL and `state` unchanged.
    pub fn authorization_url(&self, state: &str) -> Result<Url, GithubError> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| GithubError::Config(format!("{}: {e}", self.config.auth_url)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for a GitHub access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, GithubError> {
        debug!("Exchanging authorization code with GitHub");
        let response = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!("GitHub token endpoint returned HTTP {status}");
            return Err(GithubError::Status(status.as_u16()));
        }

        let payload: GithubTokenResponse = response
            .json()
            .await
            .map_err(|e| GithubError::Parse(e.to_string()))?;

        if let Some(error_code) = payload.error {
            return Err(GithubError::Rejected(
                payload.error_description.unwrap_or(error_code),
            ));
        }

        payload
            .access_token
            .ok_or_else(|| GithubError::Parse("response is missing access_token".to_string()))
    }

    /// Fetch the profile of the user the token belongs to.
    pub async fn fetch_user(&self, access_token: &str) -> Result<serde_json::Value, GithubError> {
        let url = format!("{}/user", self.config.api_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GithubError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| GithubError::Parse(e.to_string()))
    }
}
