//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, windows > 0, delays ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the client

use crate::config::schema::{ClientConfig, EndpointLimit};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    ZeroCacheCapacity,
    ZeroLimit { endpoint: String },
    ZeroWindow { endpoint: String },
    EmptyEndpointKey,
    ZeroMaxAttempts,
    DelayBoundsInverted { base_ms: u64, max_ms: u64 },
    NegativeBudgetRatio(f32),
    ZeroQueueSize,
    ZeroConcurrency,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::ZeroCacheCapacity => {
                write!(f, "cache.max_entries must be greater than zero")
            }
            ValidationError::ZeroLimit { endpoint } => {
                write!(f, "rate limit for '{}' must be greater than zero", endpoint)
            }
            ValidationError::ZeroWindow { endpoint } => {
                write!(f, "rate window for '{}' must be greater than zero", endpoint)
            }
            ValidationError::EmptyEndpointKey => {
                write!(f, "rate_limit.endpoints contains an empty endpoint key")
            }
            ValidationError::ZeroMaxAttempts => {
                write!(f, "retry.max_attempts must be greater than zero")
            }
            ValidationError::DelayBoundsInverted { base_ms, max_ms } => {
                write!(
                    f,
                    "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                    base_ms, max_ms
                )
            }
            ValidationError::NegativeBudgetRatio(ratio) => {
                write!(f, "retry.budget_ratio must not be negative (got {})", ratio)
            }
            ValidationError::ZeroQueueSize => {
                write!(f, "queue.max_size must be greater than zero")
            }
            ValidationError::ZeroConcurrency => {
                write!(f, "queue.concurrency_limit must be greater than zero")
            }
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    check_limit("default", &config.rate_limit.default, &mut errors);
    for (endpoint, limits) in &config.rate_limit.endpoints {
        if endpoint.is_empty() {
            errors.push(ValidationError::EmptyEndpointKey);
        }
        check_limit(endpoint, limits, &mut errors);
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroMaxAttempts);
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::DelayBoundsInverted {
            base_ms: config.retry.base_delay_ms,
            max_ms: config.retry.max_delay_ms,
        });
    }
    if config.retry.budget_ratio < 0.0 {
        errors.push(ValidationError::NegativeBudgetRatio(config.retry.budget_ratio));
    }

    if config.queue.max_size == 0 {
        errors.push(ValidationError::ZeroQueueSize);
    }
    if config.queue.concurrency_limit == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_limit(endpoint: &str, limits: &EndpointLimit, errors: &mut Vec<ValidationError>) {
    if limits.limit == 0 {
        errors.push(ValidationError::ZeroLimit {
            endpoint: endpoint.to_string(),
        });
    }
    if limits.window_ms == 0 {
        errors.push(ValidationError::ZeroWindow {
            endpoint: endpoint.to_string(),
        });
    }
}
