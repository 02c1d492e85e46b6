//! Resilient client composition.
//!
//! # Data Flow
//! ```text
//! call(endpoint, caller, operation, options):
//!     cache check    → hit? short-circuit to success
//!     rate check     → denied? fail with RateLimitExceeded (no queue entry)
//!     queue          → wait for a concurrency slot
//!     execute        → (retry wait → execute)* under the retry policy
//!     cache store    → on success, when the call was cacheable
//! ```
//!
//! # Design Decisions
//! - Admission rejections never consume retry attempts
//! - Each attempt races a per-attempt timeout; timeouts are retryable by
//!   default
//! - All resilience pieces are injected at construction, not ambient

pub mod pipeline;

pub use pipeline::{CallOptions, ResilientClient};
