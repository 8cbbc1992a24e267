//! Network layer subsystem.
//!
//! Holds the root CA the proxy engine signs per-host leaf certificates with.

pub mod tls;

pub use tls::{CertificateError, CertificateStore};
