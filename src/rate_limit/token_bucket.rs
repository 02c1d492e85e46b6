//! Token-bucket limiter, the smoother alternative to fixed windows.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::rate_limit::RateLimitDecision;

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token-bucket rate limiter keyed by (caller, endpoint).
///
/// Bucket capacity is the endpoint's `limit`; the refill rate spreads that
/// limit evenly over the endpoint's window, so sustained throughput matches
/// the fixed-window configuration while bursts drain the bucket.
pub struct TokenBucketLimiter {
    buckets: Mutex<HashMap<(String, String), TokenBucket>>,
    config: RateLimitConfig,
}

impl TokenBucketLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Check the pair and consume one token if available.
    pub fn check_and_consume(&self, caller: &str, endpoint: &str) -> RateLimitDecision {
        let limits = self.config.limits_for(endpoint);
        let capacity = limits.limit as f64;
        let refill_rate = capacity / Duration::from_millis(limits.window_ms).as_secs_f64();

        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry((caller.to_string(), endpoint.to_string()))
            .or_insert_with(|| TokenBucket::new(capacity));

        let allowed = bucket.try_acquire(capacity, refill_rate);
        let remaining = bucket.tokens.floor().max(0.0) as u32;
        let reset_at = if allowed {
            Instant::now()
        } else {
            // Instant at which one whole token will have refilled
            let deficit = (1.0 - bucket.tokens).max(0.0);
            Instant::now() + Duration::from_secs_f64(deficit / refill_rate)
        };

        if !allowed {
            metrics::record_rate_limited("token_bucket");
        }

        RateLimitDecision {
            allowed,
            remaining,
            reset_at,
        }
    }
}
