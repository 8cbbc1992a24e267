//! Credential-substituting request/response hooks.
//!
//! # Request path
//! ```text
//! flow.request.host
//!     → HostMatcher (no match: return, nothing touched)
//!     → StatsRegistry::increment_requests (once per request)
//!     → header site  (overwrite, +1 replacement)
//!     → query site   (rewrite value, +1 replacement)
//!     → log request, substitutions, body preview
//! ```
//!
//! Both sites are blind overwrites: a request that already carries the
//! configured credential is still counted.

use std::sync::Arc;

use hyper::header::{HeaderName, HeaderValue};
use hyper::Uri;

use crate::config::InterceptionConfig;
use crate::credential::Credential;
use crate::interception::flow::{Flow, FlowHooks};
use crate::interception::matcher::HostMatcher;
use crate::interception::preview::{decode_preview, DecodedBody};
use crate::interception::rewrite::{mask, QueryRewriter};
use crate::observability::metrics::StatsRegistry;

/// Where a credential was found in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Header,
    Query,
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Site::Header => write!(f, "a header value"),
            Site::Query => write!(f, "a query parameter"),
        }
    }
}

impl Site {
    fn as_str(&self) -> &'static str {
        match self {
            Site::Header => "header",
            Site::Query => "query",
        }
    }
}

/// What the request hook did to one flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOutcome {
    /// Sequence number assigned to a matched request.
    pub sequence: Option<u64>,
    /// Sites rewritten, in evaluation order.
    pub replaced: Vec<Site>,
    /// Credential seen before rewriting; the header wins when both exist.
    pub original_key: Option<String>,
}

/// What the response hook saw for one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: u16,
    /// Only a 200 counts as success.
    pub success: bool,
    /// Time from the request reaching the proxy to the response headers.
    pub duration_ms: u64,
}

impl RequestOutcome {
    pub fn matched(&self) -> bool {
        self.sequence.is_some()
    }
}

/// Rewrites the credential on requests to the target host and logs traffic.
#[derive(Debug, Clone)]
pub struct Interceptor {
    matcher: HostMatcher,
    header: HeaderName,
    header_value: HeaderValue,
    query: QueryRewriter,
    credential: Credential,
    stats: Arc<StatsRegistry>,
    request_preview_chars: usize,
    response_preview_chars: usize,
    key_preview_chars: usize,
}

/// Error building an interceptor from configuration.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    #[error("invalid header name `{0}`")]
    HeaderName(String),
    #[error("invalid query parameter pattern: {0}")]
    Query(#[from] regex::Error),
    #[error("credential cannot be sent as {0}; check the secret for whitespace or control characters")]
    Credential(Site),
}

impl Interceptor {
    pub fn new(
        config: &InterceptionConfig,
        credential: Credential,
        stats: Arc<StatsRegistry>,
    ) -> Result<Self, InterceptorError> {
        let header = HeaderName::from_bytes(config.header_name.as_bytes())
            .map_err(|_| InterceptorError::HeaderName(config.header_name.clone()))?;
        let mut header_value = HeaderValue::from_str(credential.expose())
            .map_err(|_| InterceptorError::Credential(Site::Header))?;
        header_value.set_sensitive(true);

        let query = QueryRewriter::new(&config.query_param)?;
        let value = credential.expose();
        let sample = format!("/?{}={}", config.query_param, value);
        if value.is_empty() || value.contains(['&', '#']) || sample.parse::<Uri>().is_err() {
            return Err(InterceptorError::Credential(Site::Query));
        }

        Ok(Self {
            matcher: HostMatcher::new(&config.target_host, config.host_match),
            header,
            header_value,
            query,
            credential,
            stats,
            request_preview_chars: config.request_preview_chars,
            response_preview_chars: config.response_preview_chars,
            key_preview_chars: config.key_preview_chars,
        })
    }

    pub fn stats(&self) -> &Arc<StatsRegistry> {
        &self.stats
    }

    /// Run the request hook and report what changed.
    pub fn process_request(&self, flow: &mut Flow) -> RequestOutcome {
        if !self.matcher.matches(&flow.request.host) {
            return RequestOutcome::default();
        }

        let sequence = self.stats.increment_requests();
        let mut outcome = RequestOutcome {
            sequence: Some(sequence),
            ..Default::default()
        };

        tracing::info!(
            flow = %flow.id,
            seq = sequence,
            method = %flow.request.method,
            url = %self.redact_url(&flow.request.url),
            "Intercepted request #{}",
            sequence
        );

        let new_key = self.credential.preview(self.key_preview_chars);

        if let Some(current) = flow.request.headers.get(&self.header) {
            let old = String::from_utf8_lossy(current.as_bytes()).into_owned();
            flow.request
                .headers
                .insert(self.header.clone(), self.header_value.clone());
            self.stats.increment_replacements();
            tracing::info!(
                flow = %flow.id,
                seq = sequence,
                site = Site::Header.as_str(),
                old = %mask(&old, self.key_preview_chars),
                new = %new_key,
                "Replaced key in header"
            );
            outcome.original_key = Some(old);
            outcome.replaced.push(Site::Header);
        }

        let rewrite = self
            .query
            .rewrite(&flow.request.url, self.credential.expose())
            .filter(|rewrite| {
                let valid = rewrite.url.parse::<Uri>().is_ok();
                if !valid {
                    tracing::warn!(flow = %flow.id, seq = sequence, "Rewritten URL is not a valid URI; query left unchanged");
                }
                valid
            });
        if let Some(rewrite) = rewrite {
            flow.request.url = rewrite.url;
            self.stats.increment_replacements();
            let original = outcome.original_key.get_or_insert(rewrite.original);
            tracing::info!(
                flow = %flow.id,
                seq = sequence,
                site = Site::Query.as_str(),
                old = %mask(original, self.key_preview_chars),
                new = %new_key,
                "Replaced key in URL"
            );
            outcome.replaced.push(Site::Query);
        }

        if let Some(body) = flow.request.body.as_ref().filter(|b| !b.is_empty()) {
            match decode_preview(body, self.request_preview_chars) {
                DecodedBody::Text(text) => {
                    tracing::info!(flow = %flow.id, seq = sequence, "Body preview: {}...", text)
                }
                binary @ DecodedBody::Binary { .. } => {
                    tracing::info!(flow = %flow.id, seq = sequence, "Body: {}", binary)
                }
            }
        }

        outcome
    }

    /// Log a response for a matched flow. Returns `None` when the flow was
    /// not intercepted or carries no response.
    pub fn process_response(&self, flow: &Flow) -> Option<ResponseOutcome> {
        if !self.matcher.matches(&flow.request.host) {
            return None;
        }
        let response = flow.response.as_ref()?;

        let status = response.status.as_u16();
        let success = status == 200;
        let duration_ms = flow.elapsed().as_millis() as u64;
        if status >= 400 {
            tracing::warn!(flow = %flow.id, status, success, duration_ms, "Response: {} ({}ms)", status, duration_ms);
        } else {
            tracing::info!(flow = %flow.id, status, success, duration_ms, "Response: {} ({}ms)", status, duration_ms);
        }

        if !success {
            match response.body.as_deref() {
                Some(body) if !body.is_empty() => {
                    match decode_preview(body, self.response_preview_chars) {
                        DecodedBody::Text(text) => {
                            tracing::warn!(flow = %flow.id, "Error: {}", text)
                        }
                        DecodedBody::Binary { reason } => {
                            tracing::warn!(flow = %flow.id, reason = %reason, "Error parsing response body")
                        }
                    }
                }
                _ => tracing::warn!(flow = %flow.id, "Error response has no body"),
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            requests = stats.requests_intercepted,
            keys_replaced = stats.keys_replaced,
            "Stats: {} requests, {} keys replaced",
            stats.requests_intercepted,
            stats.keys_replaced
        );
        Some(ResponseOutcome {
            status,
            success,
            duration_ms,
        })
    }

    /// URL with the credential parameter masked, for logs.
    fn redact_url(&self, url: &str) -> String {
        match self.query.rewrite(url, "***") {
            Some(rewrite) => rewrite.url,
            None => url.to_string(),
        }
    }
}

impl FlowHooks for Interceptor {
    fn intercepts(&self, host: &str) -> bool {
        self.matcher.matches(host)
    }

    fn on_request(&self, flow: &mut Flow) {
        self.process_request(flow);
    }

    fn on_response(&self, flow: &Flow) {
        self.process_response(flow);
    }
}
