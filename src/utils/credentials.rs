//! Access tokens for Google APIs.
//!
//! BigQuery and Discovery Engine share one [`TokenSource`] and ask it for a
//! token on every request. Application Default Credentials refresh tokens
//! before they expire; a static token from `GOOGLE_OAUTH_ACCESS_TOKEN`
//! overrides discovery for local runs and tests.

use crate::utils::config::GoogleCloudConfig;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// OAuth scope covering BigQuery and Discovery Engine.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("No Google credentials found: {0}")]
    Discovery(String),

    #[error("Failed to obtain an access token: {0}")]
    Token(String),
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Bearer token for the next request; `None` sends it unauthenticated.
    async fn token(&self) -> Result<Option<String>, CredentialsError>;
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, CredentialsError> {
        Ok(self.0.clone())
    }
}

/// Application Default Credentials: service account key, gcloud user
/// credentials or the metadata server, whichever is found first.
pub struct ApplicationDefaultCredentials {
    provider: Arc<dyn gcp_auth::TokenProvider>,
}

impl ApplicationDefaultCredentials {
    pub async fn discover() -> Result<Self, CredentialsError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| CredentialsError::Discovery(e.to_string()))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl TokenSource for ApplicationDefaultCredentials {
    async fn token(&self) -> Result<Option<String>, CredentialsError> {
        let token = self
            .provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| CredentialsError::Token(e.to_string()))?;
        Ok(Some(token.as_str().to_string()))
    }
}

/// The static token when configured, otherwise Application Default Credentials.
pub async fn token_source_from_config(
    config: &GoogleCloudConfig,
) -> Result<Arc<dyn TokenSource>, CredentialsError> {
    match &config.access_token {
        Some(token) => {
            info!("Using static Google access token from GOOGLE_OAUTH_ACCESS_TOKEN");
            Ok(Arc::new(StaticToken::new(Some(token.clone()))))
        }
        None => {
            let credentials = ApplicationDefaultCredentials::discover().await?;
            info!("Using Google Application Default Credentials");
            Ok(Arc::new(credentials))
        }
    }
}
