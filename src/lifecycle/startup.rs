//! Startup orchestration.
//!
//! # Order
//! 1. Resolve the replacement credential (fatal on failure)
//! 2. Load or generate the root CA (fatal on failure)
//! 3. Bind the metrics listener (fatal on failure)
//! 4. Start the proxy; both servers stop on the same shutdown signal
//!
//! Nothing is bound until the credential and CA are in hand, so a
//! misconfigured start never leaves a half-running proxy behind.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{ConfigError, ProxyConfig, ValidationError};
use crate::credential::{CredentialProvider, CredentialSources, GcpSecretManager, ResolvedCredential};
use crate::error::Result;
use crate::http::ProxyServer;
use crate::interception::Interceptor;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::net::CertificateStore;
use crate::observability::{MetricsServer, StatsRegistry};

/// Run the proxy until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<()> {
    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let store = GcpSecretManager::new();
    let sources = CredentialSources::from_env(&config.credential);
    let resolved = CredentialProvider::new(&store).resolve(&sources).await?;

    serve(config, resolved, &shutdown).await
}

/// Bring up the proxy (and metrics endpoint) with an already resolved
/// credential, running until `shutdown` is triggered.
pub async fn serve(
    config: ProxyConfig,
    resolved: ResolvedCredential,
    shutdown: &Shutdown,
) -> Result<()> {
    let authority = CertificateStore::new(&config.tls.ca_dir).ensure_authority(config.tls.cache_size)?;

    let stats = Arc::new(StatsRegistry::new());
    let interceptor = Arc::new(Interceptor::new(
        &config.interception,
        resolved.credential.clone(),
        Arc::clone(&stats),
    )?);

    let proxy_addr: SocketAddr = config.listener.bind_address.parse().map_err(|_| {
        ConfigError::Validation(vec![ValidationError::InvalidListenAddress(
            config.listener.bind_address.clone(),
        )])
    })?;

    let metrics = if config.observability.metrics_enabled {
        Some(MetricsServer::bind(&config.observability.metrics_address(), Arc::clone(&stats)).await?)
    } else {
        None
    };
    let metrics_addr = match &metrics {
        Some(server) => Some(server.local_addr()?),
        None => None,
    };

    tracing::info!(
        target_host = %config.interception.target_host,
        host_match = ?config.interception.host_match,
        key_preview = %resolved.credential.preview(config.interception.key_preview_chars),
        key_source = %resolved.source,
        listen = %proxy_addr,
        metrics = %metrics_addr.map_or_else(|| "disabled".to_string(), |a| format!("http://{a}/metrics")),
        "Antigravity proxy ready"
    );
    tracing::info!(
        "Point HTTP_PROXY/HTTPS_PROXY at http://{} and trust {:?}",
        proxy_addr,
        CertificateStore::new(&config.tls.ca_dir).cert_path()
    );

    let metrics_task = metrics.map(|server| {
        let signal = shutdown.signal();
        tokio::spawn(async move {
            if let Err(e) = server.run(signal).await {
                tracing::error!(error = %e, "Metrics endpoint failed");
            }
        })
    });

    let result = ProxyServer::new(proxy_addr, authority, interceptor)
        .run(shutdown.signal())
        .await;
    if result.is_err() {
        shutdown.trigger();
    }

    if let Some(task) = metrics_task {
        let _ = task.await;
    }

    let snapshot = stats.snapshot();
    tracing::info!(
        requests_intercepted = snapshot.requests_intercepted,
        keys_replaced = snapshot.keys_replaced,
        "Shutdown complete"
    );

    result.map_err(Into::into)
}
