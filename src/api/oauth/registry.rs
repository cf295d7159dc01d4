use super::models::{ClientRecord, ClientRegistrationRequest};
use super::random_hex;
use crate::config::OAuthConfig;
use chrono::Utc;
use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("redirect_uris must not be empty")]
    MissingRedirectUris,

    #[error("redirect_uri '{0}' is not a valid URL")]
    InvalidRedirectUri(String),

    #[error("Requested scope '{0}' is not allowed")]
    InvalidScope(String),
}

/// Keyed store of registered OAuth clients.
///
/// Registration is an upsert: re-registering a client id replaces the
/// previous record. The client Claude.ai connects with is seeded at
/// construction so the flow works without a registration round-trip.
pub struct ClientRegistry {
    valid_scopes: Vec<String>,
    default_scope: String,
    clients: RwLock<HashMap<String, ClientRecord>>,
}

impl ClientRegistry {
    pub fn from_settings(config: &OAuthConfig) -> Self {
        let seed = ClientRecord {
            client_id: config.seed_client_id.clone(),
            client_secret: None,
            redirect_uris: vec![config.seed_redirect_uri.clone()],
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            response_types: vec!["code".to_string()],
            token_endpoint_auth_method: "none".to_string(),
            scope: Some(config.scope.clone()),
            client_name: Some(config.seed_client_name.clone()),
            client_id_issued_at: Utc::now().timestamp(),
        };
        info!("Pre-registered client '{}'", seed.client_id);

        let mut clients = HashMap::new();
        clients.insert(seed.client_id.clone(), seed);
        Self {
            valid_scopes: config.valid_scopes.clone(),
            default_scope: config.default_scope.clone(),
            clients: RwLock::new(clients),
        }
    }

    /// Store a client from registration metadata, assigning a fresh id when
    /// none was supplied and a secret when the auth method requires one.
    pub async fn register(
        &self,
        request: ClientRegistrationRequest,
    ) -> Result<ClientRecord, RegistryError> {
        if request.redirect_uris.is_empty() {
            return Err(RegistryError::MissingRedirectUris);
        }
        for uri in &request.redirect_uris {
            if Url::parse(uri).is_err() {
                return Err(RegistryError::InvalidRedirectUri(uri.clone()));
            }
        }

        let scope = match request.scope {
            Some(requested) => {
                for entry in requested.split_whitespace() {
                    if !self.valid_scopes.iter().any(|valid| valid == entry) {
                        return Err(RegistryError::InvalidScope(entry.to_string()));
                    }
                }
                requested
            }
            None => self.default_scope.clone(),
        };

        let token_endpoint_auth_method = request
            .token_endpoint_auth_method
            .unwrap_or_else(|| "client_secret_post".to_string());
        let client_secret = if token_endpoint_auth_method == "none" {
            None
        } else {
            Some(random_hex(32))
        };

        let record = ClientRecord {
            client_id: request
                .client_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            client_secret,
            redirect_uris: request.redirect_uris,
            grant_types: request
                .grant_types
                .unwrap_or_else(|| vec!["authorization_code".to_string()]),
            response_types: request
                .response_types
                .unwrap_or_else(|| vec!["code".to_string()]),
            token_endpoint_auth_method,
            scope: Some(scope),
            client_name: request.client_name,
            client_id_issued_at: Utc::now().timestamp(),
        };

        let mut clients = self.clients.write().await;
        if clients
            .insert(record.client_id.clone(), record.clone())
            .is_some()
        {
            debug!("Replaced registration for client '{}'", record.client_id);
        }
        Ok(record)
    }

    /// Look up a client by id.
    pub async fn lookup(&self, client_id: &str) -> Option<ClientRecord> {
        self.clients.read().await.get(client_id).cloned()
    }
}
