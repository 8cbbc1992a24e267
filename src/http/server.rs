//! MITM proxy server setup.
//!
//! # Responsibilities
//! - Bind the proxy listener
//! - Terminate TLS for intercepted hosts with the local root CA
//! - Run [`FlowHandler`] around each exchange
//! - Stop on the shutdown signal

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hudsucker::certificate_authority::RcgenAuthority;
use hudsucker::rustls::crypto::aws_lc_rs::default_provider;
use hudsucker::Proxy;
use thiserror::Error;

use crate::http::handler::FlowHandler;
use crate::interception::FlowHooks;

/// Error raised while building or running the proxy.
#[derive(Debug, Error)]
#[error("proxy error: {0}")]
pub struct ProxyError(String);

/// Intercepting HTTP(S) proxy.
pub struct ProxyServer<H> {
    addr: SocketAddr,
    authority: RcgenAuthority,
    hooks: Arc<H>,
}

impl<H: FlowHooks> ProxyServer<H> {
    pub fn new(addr: SocketAddr, authority: RcgenAuthority, hooks: Arc<H>) -> Self {
        Self {
            addr,
            authority,
            hooks,
        }
    }

    /// Run until `shutdown` resolves. In-flight exchanges are allowed to
    /// finish before this returns.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ProxyError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(address = %self.addr, "Proxy server starting");

        let proxy = Proxy::builder()
            .with_addr(self.addr)
            .with_ca(self.authority)
            .with_rustls_connector(default_provider())
            .with_http_handler(FlowHandler::new(self.hooks))
            .with_graceful_shutdown(shutdown)
            .build()
            .map_err(|e| ProxyError(e.to_string()))?;

        proxy.start().await.map_err(|e| ProxyError(e.to_string()))?;

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}
