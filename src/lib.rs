//! Antigravity credential-substituting HTTPS proxy.

pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod interception;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::{Error, Result};
pub use http::ProxyServer;
pub use interception::Interceptor;
pub use lifecycle::Shutdown;
pub use observability::StatsRegistry;
