//! The request/response exchange handed to interception hooks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HOST};
use hyper::{Method, StatusCode, Uri};

/// Relaxed ordering is enough: ids only need to be unique.
static FLOW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a flow, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(u64);

impl FlowId {
    pub fn new() -> Self {
        Self(FLOW_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

/// Outbound request as seen by the hooks. Headers and URL are mutable and
/// are what the engine forwards.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    pub method: Method,
    pub url: String,
    pub host: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Inbound response, read-only for the hooks.
#[derive(Debug, Clone)]
pub struct FlowResponse {
    pub status: StatusCode,
    pub body: Option<Bytes>,
}

/// One intercepted exchange.
#[derive(Debug, Clone)]
pub struct Flow {
    pub id: FlowId,
    pub request: FlowRequest,
    pub response: Option<FlowResponse>,
    /// When the engine handed the request over.
    pub started: Instant,
}

impl Flow {
    pub fn new(request: FlowRequest) -> Self {
        Self {
            id: FlowId::new(),
            request,
            response: None,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl FlowRequest {
    /// Build a request view from its parts, deriving the destination host
    /// from the URI or, for origin-form URIs, the `Host` header.
    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap, body: Option<Bytes>) -> Self {
        let host = destination_host(uri, &headers).unwrap_or_default();
        Self {
            method,
            url: uri.to_string(),
            host,
            headers,
            body,
        }
    }

    /// Shorthand for tests and tools: a GET with no body.
    pub fn get(url: &str) -> Self {
        let uri: Uri = url.parse().unwrap_or_default();
        Self::from_parts(Method::GET, &uri, HeaderMap::new(), None)
    }
}

/// Destination host of a request, without port.
pub fn destination_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    if let Some(host) = uri.host() {
        return Some(host.to_string());
    }

    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.parse::<hyper::http::uri::Authority>().ok())
        .map(|authority| authority.host().to_string())
}

/// Request/response hooks driven by the proxy engine.
///
/// Implementations must tolerate concurrent calls for different flows.
pub trait FlowHooks: Send + Sync + 'static {
    /// Whether flows to `host` are handed to the hooks at all. Hosts that
    /// return false are forwarded (and tunnelled) untouched.
    fn intercepts(&self, host: &str) -> bool;

    /// Called once per outbound request; may mutate headers and URL.
    fn on_request(&self, flow: &mut Flow);

    /// Called once per inbound response; observation only.
    fn on_response(&self, flow: &Flow);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn flow_ids_unique() {
        assert_ne!(FlowId::new(), FlowId::new());
    }

    #[test]
    fn elapsed_counts_from_start() {
        let mut flow = Flow::new(FlowRequest::get("https://api.example.com/"));
        flow.started -= Duration::from_millis(250);
        assert!(flow.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn host_from_absolute_uri() {
        let request = FlowRequest::get("https://generativelanguage.googleapis.com:443/v1beta/models");
        assert_eq!(request.host, "generativelanguage.googleapis.com");
        assert_eq!(request.url, "https://generativelanguage.googleapis.com:443/v1beta/models");
    }

    #[test]
    fn host_header_fallback_strips_port() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("api.example.com:8443"));
        let uri: Uri = "/v1/models?key=abc".parse().unwrap();

        let request = FlowRequest::from_parts(Method::POST, &uri, headers, None);
        assert_eq!(request.host, "api.example.com");
    }

    #[test]
    fn missing_host_is_empty() {
        let uri: Uri = "/only/a/path".parse().unwrap();
        let request = FlowRequest::from_parts(Method::GET, &uri, HeaderMap::new(), None);
        assert!(request.host.is_empty());
    }
}
