//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the target host and credential locations are usable
//! - Validate value ranges (preview lengths > 0, addresses parse)
//! - Detect the proxy and metrics listeners colliding
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use hyper::header::HeaderName;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("interception.target_host `{0}` is not a valid domain name")]
    InvalidTargetHost(String),

    #[error("interception.header_name `{0}` is not a valid HTTP header name")]
    InvalidHeaderName(String),

    #[error("interception.query_param `{0}` must be non-empty and free of `=`, `&`, `?` and `#`")]
    InvalidQueryParam(String),

    #[error("{field} must be greater than zero")]
    ZeroLength { field: &'static str },

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidListenAddress(String),

    #[error("observability.metrics_host `{0}` is not an IP address")]
    InvalidMetricsHost(String),

    #[error("metrics endpoint and proxy listener both use {0}")]
    AddressCollision(SocketAddr),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let interception = &config.interception;

    if !is_domain(&interception.target_host) {
        errors.push(ValidationError::InvalidTargetHost(
            interception.target_host.clone(),
        ));
    }

    if HeaderName::from_bytes(interception.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            interception.header_name.clone(),
        ));
    }

    let param = &interception.query_param;
    if param.is_empty() || param.contains(['=', '&', '?', '#']) {
        errors.push(ValidationError::InvalidQueryParam(param.clone()));
    }

    for (field, value) in [
        ("interception.request_preview_chars", interception.request_preview_chars),
        ("interception.response_preview_chars", interception.response_preview_chars),
        ("interception.key_preview_chars", interception.key_preview_chars),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLength { field });
        }
    }

    let listen = config.listener.bind_address.parse::<SocketAddr>();
    if listen.is_err() {
        errors.push(ValidationError::InvalidListenAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let obs = &config.observability;
    let metrics_ip = obs.metrics_host.parse::<IpAddr>();
    if metrics_ip.is_err() {
        errors.push(ValidationError::InvalidMetricsHost(obs.metrics_host.clone()));
    }

    if let (true, Ok(listen), Ok(ip)) = (obs.metrics_enabled, listen, metrics_ip) {
        let metrics = SocketAddr::new(ip, obs.metrics_port);
        let overlaps = listen.port() == metrics.port()
            && (listen.ip() == metrics.ip()
                || listen.ip().is_unspecified()
                || metrics.ip().is_unspecified());
        if overlaps && listen.port() != 0 {
            errors.push(ValidationError::AddressCollision(metrics));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_domain(host: &str) -> bool {
    matches!(url::Host::parse(host), Ok(url::Host::Domain(_))) && !host.contains(['/', ':'])
}
