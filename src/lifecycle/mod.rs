//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → queue stops admitting → queued and running work drains
//!     → subscribed tasks observe the signal and wind down
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop admission first, then drain
//! - In-flight operations are never force-terminated

pub mod shutdown;

pub use shutdown::Shutdown;
