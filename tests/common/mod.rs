//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};

use antigravity_proxy::config::{HostMatch, InterceptionConfig};
use antigravity_proxy::credential::Credential;
use antigravity_proxy::net::CertificateStore;
use antigravity_proxy::{Interceptor, ProxyServer, Shutdown, StatsRegistry};

pub const TEST_KEY: &str = "AIzaSyReplacementKeyForTests";

/// Start a backend that echoes what it received as JSON.
///
/// `/status/{code}` answers with that status and a plain-text body.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(uri: Uri, headers: HeaderMap, body: Bytes) -> axum::response::Response {
    if let Some(code) = uri.path().strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        return (status, format!("upstream said {}", status.as_u16())).into_response();
    }

    let header_map: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    Json(json!({
        "path_and_query": uri.path_and_query().map(|p| p.as_str()).unwrap_or("/"),
        "headers": header_map,
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

pub const SECRET_TOKEN: &str = "test-access-token";

/// Start a stand-in for the Secret Manager `:access` endpoint under `/v1`.
///
/// Secrets in project `p`: `s` holds `AIzaFromSecret\n`, `denied` answers
/// 403, `empty` has no payload. Requests without the bearer token get 401.
pub async fn start_secret_manager_mock() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(access_secret);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn access_secret(uri: Uri, headers: HeaderMap) -> axum::response::Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {SECRET_TOKEN}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }

    let name = uri
        .path()
        .strip_prefix("/v1/projects/p/secrets/")
        .and_then(|rest| rest.strip_suffix("/versions/latest:access"));
    match name {
        Some("s") => Json(json!({
            "name": "projects/p/secrets/s/versions/3",
            "payload": { "data": "QUl6YUZyb21TZWNyZXQK" }
        }))
        .into_response(),
        Some("denied") => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "status": "PERMISSION_DENIED" } })),
        )
            .into_response(),
        Some("empty") => Json(json!({ "name": "projects/p/secrets/empty/versions/1" })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A proxy running in the background.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub stats: Arc<StatsRegistry>,
    pub shutdown: Shutdown,
    _ca_dir: TempDir,
}

impl TestProxy {
    /// Proxy on `port` that rewrites requests to `target_host` with [`TEST_KEY`].
    pub async fn start(port: u16, target_host: &str) -> Self {
        let ca_dir = TempDir::new().unwrap();
        let authority = CertificateStore::new(ca_dir.path())
            .ensure_authority(100)
            .unwrap();

        let config = InterceptionConfig {
            target_host: target_host.to_string(),
            host_match: HostMatch::Exact,
            ..Default::default()
        };
        let stats = Arc::new(StatsRegistry::new());
        let interceptor = Arc::new(
            Interceptor::new(&config, Credential::new(TEST_KEY), Arc::clone(&stats)).unwrap(),
        );

        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        tokio::spawn(async move {
            let _ = ProxyServer::new(addr, authority, interceptor).run(signal).await;
        });
        wait_for_port(addr).await;

        Self {
            addr,
            stats,
            shutdown,
            _ca_dir: ca_dir,
        }
    }

    /// Client that sends everything through this proxy.
    pub fn client(&self) -> reqwest::Client {
        proxied_client(self.addr)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn proxied_client(proxy: SocketAddr) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::all(format!("http://{proxy}")).unwrap())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Client that ignores any proxy settings in the environment.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_port(addr: SocketAddr) {
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {addr}");
}
