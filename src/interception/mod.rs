//! Interception subsystem.
//!
//! # Data Flow
//! ```text
//! proxy engine (http::handler)
//!     → flow.rs (Flow built from the engine's request)
//!     → interceptor.rs (FlowHooks::on_request)
//!         → matcher.rs (is this the target host?)
//!         → rewrite.rs (header / query credential substitution)
//!         → preview.rs (bounded body previews for logs)
//!     → engine forwards the mutated request
//!     → interceptor.rs (FlowHooks::on_response, observation only)
//! ```
//!
//! Nothing here touches the network, so the whole pipeline is testable
//! with hand-built flows.

pub mod flow;
pub mod interceptor;
pub mod matcher;
pub mod preview;
pub mod rewrite;

pub use flow::{Flow, FlowHooks, FlowId, FlowRequest, FlowResponse};
pub use interceptor::{Interceptor, InterceptorError, RequestOutcome, ResponseOutcome, Site};
pub use matcher::HostMatcher;
pub use preview::{decode_preview, DecodedBody};
