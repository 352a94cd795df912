//! Fixed-window request limiter for the order-status endpoint.
//!
//! Keyed by client identity as seen at the network layer (source address).
//! That key is weak behind shared NATs and proxies, where unrelated callers
//! pool into one window; the limitation is accepted rather than replaced
//! with an application-level identity scheme.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the caller's current window resets.
    pub reset_after_secs: u64,
}

#[derive(Clone, Copy, Debug)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Counts requests per key inside fixed windows. Time is passed in by the
/// caller so tests can step through window boundaries deterministically.
#[derive(Clone, Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    windows: HashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(window_secs: u64, max_requests: u32) -> Self {
        Self {
            window: Duration::seconds(window_secs as i64),
            max_requests,
            windows: HashMap::new(),
        }
    }

    pub fn check(&mut self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let window = self
            .windows
            .entry(key.to_owned())
            .and_modify(|window| {
                if now - window.started_at >= self.window {
                    window.started_at = now;
                    window.count = 0;
                }
            })
            .or_insert(Window { started_at: now, count: 0 });

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        let elapsed = (now - window.started_at).num_seconds().max(0) as u64;
        let window_secs = self.window.num_seconds().max(0) as u64;
        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_after_secs: window_secs.saturating_sub(elapsed),
        }
    }
}
