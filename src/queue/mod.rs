//! Bounded request queue.
//!
//! # Data Flow
//! ```text
//! enqueue(task, priority):
//!     → full? reject immediately
//!     → insert in priority order (FIFO within a tier)
//!     → dispatch: while a concurrency slot is free, pop the head and spawn
//!     → task finishes → slot freed → dispatch again (no polling)
//! ```
//!
//! # Design Decisions
//! - Concurrency is bounded by a semaphore; the permit lives as long as
//!   the spawned task
//! - One task's failure reaches only its own handle
//! - Queued items can be cancelled; running work is never force-killed

pub mod dispatch;

pub use dispatch::{QueueHandle, QueueStats, RequestQueue};
