//! Fixed-window request counting keyed by client and route.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracked windows before expired entries are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared request counter.
///
/// Check and increment happen under one lock, so concurrent requests from the
/// same client can never both take the last slot.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    windows: Mutex<HashMap<(String, &'static str), Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request from `client` on `route` against `limit`
    pub fn check_and_consume(&self, client: &str, route: &'static str, limit: u32) -> RateDecision {
        self.check_and_consume_at(client, route, limit, Instant::now())
    }

    fn check_and_consume_at(
        &self,
        client: &str,
        route: &'static str,
        limit: u32,
        now: Instant,
    ) -> RateDecision {
        if limit == 0 {
            return RateDecision::Allowed;
        }

        // Counters stay valid after a panicking holder
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows
            .entry((client.to_string(), route))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= limit {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            return RateDecision::Denied { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed
    }
}
