//! # Booking throttle
//!
//! Booking writes are throttled per caller through an injected [`RateLimiter`]
//! held in the API state. The default implementation counts requests in fixed
//! windows.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// Decides whether a request identified by `key` may proceed.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, key: &str) -> bool;

    /// Forgets state that can no longer affect a decision.
    fn purge_expired(&self) {}
}

/// Allows `max` requests per key in each window of length `window`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use agenda_api::middleware::rate_limit::{FixedWindowRateLimiter, RateLimiter};
///
/// let limiter = FixedWindowRateLimiter::new(2, Duration::from_secs(60));
/// assert!(limiter.allow("reserve:alice"));
/// assert!(limiter.allow("reserve:alice"));
/// assert!(!limiter.allow("reserve:alice"));
/// assert!(limiter.allow("reserve:bob"));
/// ```
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl FixedWindowRateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: DashMap::new(),
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max {
            debug!(key, "Rate limit reached");
            return false;
        }
        entry.count += 1;
        true
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.window);
    }
}
