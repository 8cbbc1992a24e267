//! Replacement credential resolution.
//!
//! # Data Flow
//! ```text
//! startup
//!     → provider.rs (pick a source by precedence)
//!         1. secret_store.rs (remote secret manager, if a project id is set)
//!         2. environment variable
//!         3. placeholder literal
//!     → Credential (immutable, shared read-only by every flow)
//! ```
//!
//! # Design Decisions
//! - Resolved exactly once, before any listener is bound
//! - A configured remote source that fails is fatal; there is no silent fallback
//! - The value never appears in `Debug` output or logs, only a masked prefix

pub mod provider;
pub mod secret_store;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use provider::{CredentialProvider, CredentialSources};
pub use secret_store::{GcpSecretManager, SecretStore};

use crate::interception::rewrite::mask;

/// The secret substituted into outgoing requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// Full value. Only for writing into requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked prefix safe for logs.
    pub fn preview(&self, chars: usize) -> String {
        mask(&self.0, chars)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

/// Where the credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    SecretManager,
    Environment,
    Placeholder,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::SecretManager => write!(f, "secret-manager"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// A credential together with its origin.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// Failure to resolve the credential from an explicitly configured source.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("secret manager request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("secret manager returned {status} for {name}: {message}")]
    Status {
        name: String,
        status: u16,
        message: String,
    },

    #[error("no access token: set GOOGLE_OAUTH_ACCESS_TOKEN or run on GCP ({0})")]
    Token(String),

    #[error("secret payload is not valid base64: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("secret {0} has no payload")]
    MissingPayload(String),

    #[error("secret {0} is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("secret {0} is empty")]
    Empty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_value() {
        let credential = Credential::new("AIzaSySuperSecretValue");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("SuperSecret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn preview_masks_value() {
        let credential = Credential::new("AIzaSySuperSecretValue");
        assert_eq!(credential.preview(15), "AIzaSySuperSecr***");
        assert_eq!(credential.expose(), "AIzaSySuperSecretValue");
    }
}
