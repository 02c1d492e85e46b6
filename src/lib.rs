//! Resilient Request Client Library
//!
//! Wraps caller-supplied asynchronous operations with a response cache,
//! admission-control rate limiting, a bounded priority queue, and
//! retry-with-backoff.
//!
//! ```text
//! call → cache → rate limiter → queue → retries → operation
//!                                  ↑ success flows back into the cache
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod queue;
pub mod rate_limit;
pub mod retry;

pub use cache::TtlCache;
pub use client::{CallOptions, ResilientClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult, OperationError};
pub use lifecycle::Shutdown;
pub use observability::events::{ClientEvent, EventSink, JsonLogSink, LogSink};
pub use queue::{QueueHandle, QueueStats, RequestQueue};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use retry::{BackoffStrategy, RetryBudget, RetryExecutor, RetryOutcome, RetryPolicy};
