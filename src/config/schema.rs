//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::retry::BackoffStrategy;

/// Root configuration for one resilient client instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Response cache settings.
    pub cache: CacheConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Request queue settings.
    pub queue: QueueConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries.
    pub max_entries: usize,

    /// TTL applied when a call does not override one, in milliseconds.
    pub default_ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl_ms: 60_000,
        }
    }
}

/// Which admission-control algorithm the limiter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterStrategy {
    FixedWindow,
    TokenBucket,
}

/// Limit for one endpoint over one window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointLimit {
    /// Maximum admitted requests per window.
    pub limit: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

/// Rate limiting configuration.
///
/// Disabling the limiter is a deliberate choice; there is no implicit
/// "no limiter wired up" bypass.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Counting algorithm.
    pub strategy: LimiterStrategy,

    /// Fallback limits for endpoints without their own entry.
    pub default: EndpointLimit,

    /// Per-endpoint overrides.
    pub endpoints: HashMap<String, EndpointLimit>,
}

impl RateLimitConfig {
    /// Limits for `endpoint`, falling back to the default entry.
    pub fn limits_for(&self, endpoint: &str) -> &EndpointLimit {
        self.endpoints.get(endpoint).unwrap_or(&self.default)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: LimiterStrategy::FixedWindow,
            default: EndpointLimit {
                limit: 100,
                window_ms: 60_000,
            },
            endpoints: HashMap::new(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. Disabled means a single attempt per call.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Backoff growth across attempts.
    pub strategy: BackoffStrategy,

    /// Base delay for backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Perturb each delay by a uniform ±10%.
    pub jitter: bool,

    /// Fraction of requests that may be retries (retry budget).
    /// e.g. 0.1 for a 10% budget; 0 disables the budget.
    pub budget_ratio: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            strategy: BackoffStrategy::Exponential,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
            jitter: true,
            budget_ratio: 0.1,
        }
    }
}

/// Request queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of waiting tasks before rejection.
    pub max_size: usize,

    /// Maximum number of tasks running at once.
    pub concurrency_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: 1_024,
            concurrency_limit: 8,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.cache.max_entries, 1_000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.strategy, BackoffStrategy::Exponential);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.queue.concurrency_limit, 8);
    }

    #[test]
    fn test_limits_for_fallback() {
        let mut config = RateLimitConfig::default();
        config.endpoints.insert(
            "search".to_string(),
            EndpointLimit {
                limit: 5,
                window_ms: 1_000,
            },
        );

        assert_eq!(config.limits_for("search").limit, 5);
        assert_eq!(config.limits_for("anything-else").limit, 100);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            [retry]
            max_attempts = 5
            strategy = "linear"

            [rate_limit]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.strategy, BackoffStrategy::Linear);
        assert!(!config.rate_limit.enabled);
        // Untouched sections keep their defaults
        assert_eq!(config.queue.max_size, 1_024);
    }
}
