//! Retry subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt fails:
//!     → policy.rs (classify: retryable or terminal?)
//!     → budget.rs (is there retry budget left?)
//!     → backoff.rs (compute the delay for this attempt)
//!     → cooperative sleep, then try again
//! ```
//!
//! # Design Decisions
//! - The backoff sleep is a task suspension, never a blocking wait
//! - Classification runs exactly once per failed attempt
//! - The retry budget prevents retry storms under sustained failure

pub mod backoff;
pub mod budget;
pub mod policy;

pub use backoff::{compute_delay, BackoffStrategy};
pub use budget::RetryBudget;
pub use policy::{RetryExecutor, RetryOutcome, RetryPolicy};
