//! Remote secret store access.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::credential::CredentialError;

const SECRET_MANAGER_API: &str = "https://secretmanager.googleapis.com/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Fully-qualified path of the latest version of a secret.
pub fn latest_version_path(project: &str, secret: &str) -> String {
    format!("projects/{project}/secrets/{secret}/versions/latest")
}

/// A store that can return the decoded bytes of a secret version.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn access_secret_version(&self, name: &str) -> Result<Vec<u8>, CredentialError>;
}

/// Google Cloud Secret Manager over its REST API.
#[derive(Debug, Clone)]
pub struct GcpSecretManager {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct AccessResponse {
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct Payload {
    data: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GcpSecretManager {
    /// Uses `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise asks the GCE
    /// metadata server for a token on each access.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: SECRET_MANAGER_API.to_string(),
            access_token: std::env::var(ACCESS_TOKEN_ENV)
                .ok()
                .filter(|token| !token.is_empty()),
        }
    }

    /// Point at a different API root with a fixed token.
    pub fn with_endpoint(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: Some(access_token.into()),
        }
    }

    async fn token(&self) -> Result<String, CredentialError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| CredentialError::Token(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CredentialError::Token(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Token(e.to_string()))?;
        Ok(token.access_token)
    }
}

impl Default for GcpSecretManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for GcpSecretManager {
    async fn access_secret_version(&self, name: &str) -> Result<Vec<u8>, CredentialError> {
        let token = self.token().await?;
        let url = format!("{}/{}:access", self.base_url.trim_end_matches('/'), name);

        tracing::debug!(secret = %name, "Fetching secret version");

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CredentialError::Status {
                name: name.to_string(),
                status: status.as_u16(),
                message: message.chars().take(300).collect(),
            });
        }

        let body: AccessResponse = response.json().await?;
        let data = body
            .payload
            .and_then(|p| p.data)
            .ok_or_else(|| CredentialError::MissingPayload(name.to_string()))?;

        Ok(STANDARD.decode(data)?)
    }
}
