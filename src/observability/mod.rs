//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Interceptor hooks produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request / substitution counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → exporter.rs (GET /metrics on its own port)
//! ```
//!
//! # Design Decisions
//! - Structured logging with per-flow fields
//! - Metrics are cheap (atomic increments)
//! - The scrape path only reads atomics and never blocks interception

pub mod exporter;
pub mod logging;
pub mod metrics;

pub use exporter::MetricsServer;
pub use metrics::{StatsRegistry, StatsSnapshot};
