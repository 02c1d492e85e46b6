//! Fixed-window counters per (caller, endpoint).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::rate_limit::RateLimitDecision;

/// One counting window for a (caller, endpoint) pair.
struct WindowState {
    window_start: Instant,
    count: u32,
}

/// Fixed-window rate limiter.
///
/// The counter resets atomically once the window has elapsed; within a
/// window the count is only ever incremented at admission time, so it can
/// never exceed the configured limit.
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<(String, String), WindowState>>,
    config: RateLimitConfig,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Check the pair and consume one slot if under the limit.
    ///
    /// An unknown caller gets a fresh window starting now.
    pub fn check_and_consume(&self, caller: &str, endpoint: &str) -> RateLimitDecision {
        let limits = self.config.limits_for(endpoint);
        let limit = limits.limit;
        let window = Duration::from_millis(limits.window_ms);
        let now = Instant::now();

        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let state = windows
            .entry((caller.to_string(), endpoint.to_string()))
            .or_insert(WindowState {
                window_start: now,
                count: 0,
            });

        if now.duration_since(state.window_start) >= window {
            state.window_start = now;
            state.count = 0;
        }

        if state.count < limit {
            state.count += 1;
            RateLimitDecision {
                allowed: true,
                remaining: limit - state.count,
                reset_at: state.window_start + window,
            }
        } else {
            metrics::record_rate_limited("fixed_window");
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: state.window_start + window,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointLimit;
    use std::thread::sleep;

    fn limiter(limit: u32, window_ms: u64) -> FixedWindowLimiter {
        let config = RateLimitConfig {
            default: EndpointLimit { limit, window_ms },
            ..RateLimitConfig::default()
        };
        FixedWindowLimiter::new(config)
    }

    #[test]
    fn test_allows_exactly_limit_calls() {
        for limit in [1u32, 5, 100] {
            let limiter = limiter(limit, 60_000);
            for i in 0..limit {
                let decision = limiter.check_and_consume("caller", "ep");
                assert!(decision.allowed, "call {} of {} should be allowed", i + 1, limit);
                assert_eq!(decision.remaining, limit - i - 1);
            }
            let decision = limiter.check_and_consume("caller", "ep");
            assert!(!decision.allowed, "call {} should be denied", limit + 1);
            assert_eq!(decision.remaining, 0);
        }
    }

    #[test]
    fn test_window_reset() {
        let limiter = limiter(2, 50);
        assert!(limiter.check_and_consume("c", "ep").allowed);
        assert!(limiter.check_and_consume("c", "ep").allowed);
        assert!(!limiter.check_and_consume("c", "ep").allowed);

        sleep(Duration::from_millis(60));
        assert!(limiter.check_and_consume("c", "ep").allowed);
    }

    #[test]
    fn test_callers_are_independent() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.check_and_consume("alice", "ep").allowed);
        assert!(!limiter.check_and_consume("alice", "ep").allowed);
        assert!(limiter.check_and_consume("bob", "ep").allowed);
    }

    #[test]
    fn test_per_endpoint_override_with_default_fallback() {
        let mut config = RateLimitConfig::default();
        config.default = EndpointLimit {
            limit: 1,
            window_ms: 60_000,
        };
        config.endpoints.insert(
            "search".to_string(),
            EndpointLimit {
                limit: 3,
                window_ms: 60_000,
            },
        );
        let limiter = FixedWindowLimiter::new(config);

        for _ in 0..3 {
            assert!(limiter.check_and_consume("c", "search").allowed);
        }
        assert!(!limiter.check_and_consume("c", "search").allowed);

        // Unconfigured endpoint uses the default entry
        assert!(limiter.check_and_consume("c", "other").allowed);
        assert!(!limiter.check_and_consume("c", "other").allowed);
    }

    #[test]
    fn test_reset_at_is_window_end() {
        let limiter = limiter(1, 60_000);
        let first = limiter.check_and_consume("c", "ep");
        let denied = limiter.check_and_consume("c", "ep");
        assert!(!denied.allowed);
        assert_eq!(denied.reset_at, first.reset_at);
        assert!(denied.reset_at > Instant::now());
    }
}
