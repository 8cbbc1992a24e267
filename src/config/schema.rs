//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the interception proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Root CA used to terminate TLS for the target host.
    pub tls: TlsConfig,

    /// Which traffic is intercepted and where the credential lives.
    pub interception: InterceptionConfig,

    /// Sources for the replacement credential.
    pub credential: CredentialConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Root certificate authority configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Directory holding the CA certificate and key (created on first run).
    pub ca_dir: String,

    /// Number of generated leaf certificates kept in memory.
    pub cache_size: u64,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            ca_dir: "./ca".to_string(),
            cache_size: 1000,
        }
    }
}

/// How a request host is compared against the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostMatch {
    /// Host must equal the target host.
    Exact,
    /// Host may also be any subdomain of the target host.
    #[default]
    Subdomain,
}

/// Interception configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Upstream API host whose requests get their credential rewritten.
    pub target_host: String,

    /// Matching rule applied to the request host.
    pub host_match: HostMatch,

    /// Header carrying the credential.
    pub header_name: String,

    /// Query parameter carrying the credential.
    pub query_param: String,

    /// Characters of request body included in the log preview.
    pub request_preview_chars: usize,

    /// Characters of an error response body included in the log preview.
    pub response_preview_chars: usize,

    /// Characters of a credential shown before masking.
    pub key_preview_chars: usize,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            target_host: "generativelanguage.googleapis.com".to_string(),
            host_match: HostMatch::Subdomain,
            header_name: "x-goog-api-key".to_string(),
            query_param: "key".to_string(),
            request_preview_chars: 200,
            response_preview_chars: 300,
            key_preview_chars: 15,
        }
    }
}

/// Credential source configuration.
///
/// Precedence: secret manager (when a project id is known), then the
/// environment variable, then the placeholder.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Secret manager project. Falls back to the `project_id_env` variable.
    pub project_id: Option<String>,

    /// Environment variable consulted when `project_id` is unset.
    pub project_id_env: String,

    /// Name of the secret holding the credential.
    pub secret_name: String,

    /// Environment variable holding the credential.
    pub env_var: String,

    /// Value used when no other source is configured.
    pub placeholder: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            project_id_env: "GCP_PROJECT_ID".to_string(),
            secret_name: "gemini-api-key".to_string(),
            env_var: "GEMINI_API_KEY".to_string(),
            placeholder: "YOUR_API_KEY_HERE".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind host.
    pub metrics_host: String,

    /// Metrics endpoint port.
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_host: "0.0.0.0".to_string(),
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    /// Socket address string for the metrics listener.
    pub fn metrics_address(&self) -> String {
        if self.metrics_host.contains(':') {
            format!("[{}]:{}", self.metrics_host, self.metrics_port)
        } else {
            format!("{}:{}", self.metrics_host, self.metrics_port)
        }
    }
}
