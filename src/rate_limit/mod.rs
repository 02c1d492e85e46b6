//! Admission-control rate limiting.
//!
//! # Data Flow
//! ```text
//! call(endpoint, caller):
//!     → look up endpoint limits (fall back to the default entry)
//!     → fixed_window.rs or token_bucket.rs, per configured strategy
//!     → allowed: proceed to the queue; denied: reject with reset_at
//! ```
//!
//! # Design Decisions
//! - Check and consume happen under one lock with no await between them,
//!   so a pending request can never sneak past the limit
//! - Denials are admission decisions, not failures; they never consume a
//!   retry attempt
//! - Disabling the limiter is an explicit configuration choice, never a
//!   silent fallback

pub mod fixed_window;
pub mod token_bucket;

use std::time::Instant;

use crate::config::{LimiterStrategy, RateLimitConfig};
use fixed_window::FixedWindowLimiter;
use token_bucket::TokenBucketLimiter;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window (or whole tokens left).
    pub remaining: u32,
    /// When the caller can expect admission again.
    pub reset_at: Instant,
}

/// Strategy-dispatching front for the configured limiter.
pub enum RateLimiter {
    FixedWindow(FixedWindowLimiter),
    TokenBucket(TokenBucketLimiter),
}

impl RateLimiter {
    /// Build the limiter selected by the configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        match config.strategy {
            LimiterStrategy::FixedWindow => {
                RateLimiter::FixedWindow(FixedWindowLimiter::new(config.clone()))
            }
            LimiterStrategy::TokenBucket => {
                RateLimiter::TokenBucket(TokenBucketLimiter::new(config.clone()))
            }
        }
    }

    /// Check the (caller, endpoint) pair and consume one slot if allowed.
    pub fn check_and_consume(&self, caller: &str, endpoint: &str) -> RateLimitDecision {
        match self {
            RateLimiter::FixedWindow(limiter) => limiter.check_and_consume(caller, endpoint),
            RateLimiter::TokenBucket(limiter) => limiter.check_and_consume(caller, endpoint),
        }
    }
}
