//! Interception counters and their text exposition.
//!
//! # Metrics
//! - `antigravity_requests_intercepted` (counter): requests that matched the target host
//! - `antigravity_keys_replaced` (counter): credential substitutions (header and query each count)
//!
//! # Design Decisions
//! - Lock-free updates (atomic `fetch_add`), so scrapes never stall interception
//! - Counters live in an explicit registry shared via `Arc`, not in globals
//! - Values start at zero with the process and are never persisted

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metric name for matched requests.
pub const REQUESTS_INTERCEPTED: &str = "antigravity_requests_intercepted";

/// Metric name for credential substitutions.
pub const KEYS_REPLACED: &str = "antigravity_keys_replaced";

/// Content type of the exposition body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.4";

/// Counters shared by every in-flight flow and the metrics endpoint.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    requests_intercepted: AtomicU64,
    keys_replaced: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub requests_intercepted: u64,
    pub keys_replaced: u64,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one matched request. Returns the new total, which doubles as
    /// the request's sequence number in logs.
    pub fn increment_requests(&self) -> u64 {
        self.requests_intercepted.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count one credential substitution.
    pub fn increment_replacements(&self) -> u64 {
        self.keys_replaced.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Read both counters.
    ///
    /// Requests are read before replacements; a snapshot taken mid-flow may
    /// include the request but not yet its substitutions.
    pub fn snapshot(&self) -> StatsSnapshot {
        let requests_intercepted = self.requests_intercepted.load(Ordering::Relaxed);
        let keys_replaced = self.keys_replaced.load(Ordering::Relaxed);
        StatsSnapshot {
            requests_intercepted,
            keys_replaced,
        }
    }

    /// Zero both counters. Used between test cases.
    pub fn reset(&self) {
        self.requests_intercepted.store(0, Ordering::Relaxed);
        self.keys_replaced.store(0, Ordering::Relaxed);
    }
}

impl StatsSnapshot {
    /// Render as `name value` lines.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(80);
        let _ = writeln!(out, "{} {}", REQUESTS_INTERCEPTED, self.requests_intercepted);
        let _ = writeln!(out, "{} {}", KEYS_REPLACED, self.keys_replaced);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn increments_return_running_total() {
        let stats = StatsRegistry::new();
        assert_eq!(stats.increment_requests(), 1);
        assert_eq!(stats.increment_requests(), 2);
        assert_eq!(stats.increment_replacements(), 1);
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                requests_intercepted: 2,
                keys_replaced: 1
            }
        );
    }

    #[test]
    fn render_format() {
        let snapshot = StatsSnapshot {
            requests_intercepted: 3,
            keys_replaced: 5,
        };
        assert_eq!(
            snapshot.render(),
            "antigravity_requests_intercepted 3\nantigravity_keys_replaced 5\n"
        );
    }

    #[test]
    fn reset_zeroes_counters() {
        let stats = StatsRegistry::new();
        stats.increment_requests();
        stats.increment_replacements();
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(StatsRegistry::new());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let stats = &stats;
                scope.spawn(move || {
                    for _ in 0..10_000 {
                        stats.increment_requests();
                        stats.increment_replacements();
                        stats.increment_replacements();
                    }
                });
            }
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests_intercepted, 80_000);
        assert_eq!(snapshot.keys_replaced, 160_000);
    }
}
