//! In-memory TTL cache.
//!
//! # Responsibilities
//! - Store responses keyed by string with a per-entry expiry
//! - Invalidate entries by tag or key prefix
//! - Bound memory by evicting the oldest-inserted entry at capacity
//!
//! # Design Decisions
//! - Expiry is lazy: an expired entry is deleted when a lookup inspects it,
//!   so a lookup can never return a stale value
//! - Eviction is by insertion age, not access recency
//! - One logical owner per instance; interior locking only serializes
//!   individual operations

pub mod ttl;

pub use ttl::{CacheStats, TtlCache};
