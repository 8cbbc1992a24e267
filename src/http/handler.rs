//! Bridge between the MITM engine and the flow hooks.
//!
//! The engine clones the handler for every request, so the flow recorded in
//! `handle_request` is the one seen again in `handle_response`.

use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full};
use hudsucker::{
    hyper::{Method, Request, Response, StatusCode, Uri},
    Body, HttpContext, HttpHandler, RequestOrResponse,
};
use hyper::body::Bytes;

use crate::interception::flow::{destination_host, Flow, FlowHooks, FlowRequest, FlowResponse};

/// HTTP handler that runs [`FlowHooks`] around every intercepted exchange.
pub struct FlowHandler<H> {
    hooks: Arc<H>,
    pending: Option<Flow>,
}

impl<H> Clone for FlowHandler<H> {
    fn clone(&self) -> Self {
        Self {
            hooks: Arc::clone(&self.hooks),
            pending: None,
        }
    }
}

impl<H: FlowHooks> FlowHandler<H> {
    pub fn new(hooks: Arc<H>) -> Self {
        Self {
            hooks,
            pending: None,
        }
    }

    /// Run the request hook and rebuild the request the engine forwards.
    async fn intercept_request(&mut self, req: Request<Body>) -> Request<Body> {
        let started = Instant::now();
        let (mut parts, body) = req.into_parts();
        let body = collect_body(body, "request").await;

        let request = FlowRequest::from_parts(
            parts.method.clone(),
            &parts.uri,
            std::mem::take(&mut parts.headers),
            body.clone(),
        );
        let mut flow = Flow::new(request);
        flow.started = started;
        self.hooks.on_request(&mut flow);

        if flow.request.url != parts.uri.to_string() {
            match flow.request.url.parse::<Uri>() {
                Ok(uri) => parts.uri = uri,
                Err(e) => tracing::warn!(
                    flow = %flow.id,
                    error = %e,
                    "Rewritten URL is not a valid URI; forwarding original"
                ),
            }
        }
        parts.headers = std::mem::take(&mut flow.request.headers);
        flow.request.body = None;
        self.pending = Some(flow);

        Request::from_parts(parts, body_from(body))
    }

    /// Attach the response to the pending flow and run the response hook.
    ///
    /// Only non-200 bodies are buffered; successful responses (often
    /// streamed) pass through without being read.
    async fn observe_response(&mut self, mut flow: Flow, res: Response<Body>) -> Response<Body> {
        let status = res.status();
        if status == StatusCode::OK {
            flow.response = Some(FlowResponse { status, body: None });
            self.hooks.on_response(&flow);
            return res;
        }

        let (parts, body) = res.into_parts();
        let body = collect_body(body, "response").await;
        flow.response = Some(FlowResponse {
            status,
            body: body.clone(),
        });
        self.hooks.on_response(&flow);

        Response::from_parts(parts, body_from(body))
    }
}

impl<H: FlowHooks> HttpHandler for FlowHandler<H> {
    async fn handle_request(&mut self, _ctx: &HttpContext, req: Request<Body>) -> RequestOrResponse {
        // CONNECT only opens the tunnel; the requests inside it come back here.
        if req.method() == Method::CONNECT {
            return RequestOrResponse::Request(req);
        }

        let host = destination_host(req.uri(), req.headers()).unwrap_or_default();
        if !self.hooks.intercepts(&host) {
            return RequestOrResponse::Request(req);
        }

        RequestOrResponse::Request(self.intercept_request(req).await)
    }

    async fn handle_response(&mut self, _ctx: &HttpContext, res: Response<Body>) -> Response<Body> {
        match self.pending.take() {
            Some(flow) => self.observe_response(flow, res).await,
            None => res,
        }
    }

    async fn should_intercept(&mut self, _ctx: &HttpContext, req: &Request<Body>) -> bool {
        let host = req.uri().host().unwrap_or_default();
        let intercept = self.hooks.intercepts(host);
        tracing::debug!(host = %host, intercept, "CONNECT");
        intercept
    }
}

/// Buffer a body. A body that fails mid-stream is replaced by an empty one.
async fn collect_body(body: Body, kind: &'static str) -> Option<Bytes> {
    match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            (!bytes.is_empty()).then_some(bytes)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read {} body", kind);
            None
        }
    }
}

fn body_from(bytes: Option<Bytes>) -> Body {
    match bytes {
        Some(bytes) => Body::from(Full::new(bytes)),
        None => Body::empty(),
    }
}
