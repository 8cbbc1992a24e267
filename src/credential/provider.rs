//! Credential source precedence.

use crate::config::CredentialConfig;
use crate::credential::secret_store::{latest_version_path, SecretStore};
use crate::credential::{Credential, CredentialError, CredentialSource, ResolvedCredential};

/// Source values gathered from configuration and the environment.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub project_id: Option<String>,
    pub secret_name: String,
    pub env_value: Option<String>,
    pub placeholder: String,
}

impl CredentialSources {
    /// Read sources using `lookup` for environment variables.
    ///
    /// Empty values count as unset.
    pub fn collect<F>(config: &CredentialConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            project_id: non_empty(config.project_id.clone())
                .or_else(|| non_empty(lookup(&config.project_id_env))),
            secret_name: config.secret_name.clone(),
            env_value: non_empty(lookup(&config.env_var)),
            placeholder: config.placeholder.clone(),
        }
    }

    /// Read sources from the process environment.
    pub fn from_env(config: &CredentialConfig) -> Self {
        Self::collect(config, |name| std::env::var(name).ok())
    }
}

/// Resolves the replacement credential once at startup.
pub struct CredentialProvider<'a> {
    store: &'a dyn SecretStore,
}

impl<'a> CredentialProvider<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        Self { store }
    }

    /// Apply the precedence: secret manager, environment, placeholder.
    ///
    /// The store is only contacted when a project id is present, and any
    /// failure there is returned rather than falling through.
    pub async fn resolve(
        &self,
        sources: &CredentialSources,
    ) -> Result<ResolvedCredential, CredentialError> {
        if let Some(project) = &sources.project_id {
            let name = latest_version_path(project, &sources.secret_name);
            tracing::info!(project = %project, secret = %sources.secret_name, "Loading credential from secret manager");

            let bytes = self.store.access_secret_version(&name).await?;
            let value =
                String::from_utf8(bytes).map_err(|_| CredentialError::InvalidUtf8(name.clone()))?;
            // `echo key | gcloud secrets create` stores the newline too.
            let value = value.trim_end();
            if value.is_empty() {
                return Err(CredentialError::Empty(name));
            }

            return Ok(ResolvedCredential {
                credential: Credential::new(value),
                source: CredentialSource::SecretManager,
            });
        }

        if let Some(value) = &sources.env_value {
            return Ok(ResolvedCredential {
                credential: Credential::new(value.as_str()),
                source: CredentialSource::Environment,
            });
        }

        tracing::warn!("No credential configured; substituting the placeholder value");
        Ok(ResolvedCredential {
            credential: Credential::new(sources.placeholder.as_str()),
            source: CredentialSource::Placeholder,
        })
    }
}
