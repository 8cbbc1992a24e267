//! Target host matching.
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - A trailing root dot is ignored (`example.com.` == `example.com`)
//! - Subdomain matching requires a label boundary, so `evilexample.com`
//!   never matches `example.com`

use crate::config::HostMatch;

/// Decides whether a destination host is the interception target.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
    rule: HostMatch,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>, rule: HostMatch) -> Self {
        Self {
            expected_host: normalize(&host.into()),
            rule,
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        let host = normalize(host);
        if host == self.expected_host {
            return true;
        }
        match self.rule {
            HostMatch::Exact => false,
            HostMatch::Subdomain => host
                .strip_suffix(self.expected_host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.') && prefix.len() > 1),
        }
    }
}

fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}
