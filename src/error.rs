//! Crate-level error for startup failures.

use thiserror::Error;

use crate::config::ConfigError;
use crate::credential::CredentialError;
use crate::http::ProxyError;
use crate::interception::InterceptorError;
use crate::net::CertificateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("failed to load credential: {0}")]
    Credential(#[from] CredentialError),

    #[error("failed to load root CA: {0}")]
    Certificate(#[from] CertificateError),

    #[error("invalid interception settings: {0}")]
    Interceptor(#[from] InterceptorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

pub type Result<T> = std::result::Result<T, Error>;
