//! Client error taxonomy.

use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure reported by a caller-supplied operation.
///
/// The retry classifier inspects this type to decide whether another
/// attempt is worthwhile. Cache misses are never errors; they surface as
/// absence from the cache.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    /// Upstream answered with an HTTP-like status code.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The attempt did not complete within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure (connection refused, reset, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// Anything else the operation wants to report.
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the client pipeline.
///
/// Admission-control rejections (`RateLimitExceeded`, `QueueFull`) are
/// reported before the operation runs and never consume a retry attempt.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The (caller, endpoint) pair is over its configured limit.
    /// `reset_at` tells the caller when the window opens again.
    #[error("rate limit exceeded")]
    RateLimitExceeded { reset_at: Instant },

    /// The request queue is at capacity.
    #[error("request queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Every attempt failed with a retryable error, or the retry budget
    /// ran out. The last error is preserved as the cause.
    #[error("retries exhausted after {attempts} attempt(s)")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: OperationError,
    },

    /// The first classified-terminal failure, preserved as the cause.
    #[error("non-retryable failure")]
    NonRetryable {
        #[source]
        source: OperationError,
    },

    /// The request was cancelled while still queued.
    #[error("request cancelled before execution")]
    Cancelled,

    /// The client is shutting down and no longer admits work.
    #[error("client is shutting down")]
    Shutdown,
}

impl ClientError {
    /// Number of attempts the operation actually ran, if any ran at all.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            ClientError::RetryExhausted { attempts, .. } => Some(*attempts),
            ClientError::NonRetryable { .. } => Some(1),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::QueueFull { capacity: 16 };
        assert_eq!(err.to_string(), "request queue is full (capacity 16)");

        let err = ClientError::RetryExhausted {
            attempts: 3,
            source: OperationError::Status(503),
        };
        assert!(err.to_string().contains("3 attempt"));
    }

    #[test]
    fn test_source_preserved() {
        use std::error::Error;

        let err = ClientError::NonRetryable {
            source: OperationError::Status(404),
        };
        let cause = err.source().expect("cause should be preserved");
        assert_eq!(cause.to_string(), "upstream returned status 404");
    }
}
