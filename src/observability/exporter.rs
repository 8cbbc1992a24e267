//! Pull-based metrics endpoint.
//!
//! Serves the [`StatsRegistry`] on its own listener, independent of the
//! proxy port. Only `GET /metrics` is answered; everything else is a 404.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::observability::metrics::{StatsRegistry, CONTENT_TYPE};

/// Build the metrics router over a shared registry.
pub fn router(stats: Arc<StatsRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .with_state(stats)
        .layer(TraceLayer::new_for_http())
}

async fn metrics_handler(State(stats): State<Arc<StatsRegistry>>) -> impl IntoResponse {
    let body = stats.snapshot().render();
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Metrics HTTP server bound to its listener but not yet serving.
pub struct MetricsServer {
    listener: TcpListener,
    stats: Arc<StatsRegistry>,
}

impl MetricsServer {
    /// Bind the metrics listener.
    pub async fn bind(addr: &str, stats: Arc<StatsRegistry>) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, stats })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Serve scrapes until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "Metrics endpoint listening on http://{}/metrics",
            addr
        );

        axum::serve(self.listener, router(self.stats))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Metrics endpoint stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn call(stats: Arc<StatsRegistry>, method: Method, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router(stats)
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn metrics_reports_snapshot() {
        let stats = Arc::new(StatsRegistry::new());
        stats.increment_requests();
        stats.increment_replacements();
        stats.increment_replacements();

        let (status, content_type, body) = call(stats, Method::GET, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; version=0.4"));
        assert_eq!(
            body,
            "antigravity_requests_intercepted 1\nantigravity_keys_replaced 2\n"
        );
    }

    #[tokio::test]
    async fn other_paths_are_empty_404() {
        let stats = Arc::new(StatsRegistry::new());
        let (status, _, body) = call(stats.clone(), Method::GET, "/other").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, _, _) = call(stats, Method::GET, "/metrics/extra").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_get_is_served() {
        let stats = Arc::new(StatsRegistry::new());
        let (status, _, _) = call(stats, Method::POST, "/metrics").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
