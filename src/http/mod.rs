//! HTTP proxy engine.
//!
//! # Data Flow
//! ```text
//! client (HTTP_PROXY / HTTPS_PROXY)
//!     → server.rs (listener, CONNECT, TLS with local CA)
//!     → handler.rs (Flow built from the request, hooks run)
//!     → upstream
//!     → handler.rs (response attached to the flow, hooks run)
//!     → client
//! ```

pub mod handler;
pub mod server;

pub use handler::FlowHandler;
pub use server::{ProxyError, ProxyServer};
