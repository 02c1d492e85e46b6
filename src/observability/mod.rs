//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → events.rs (typed hooks delivered to the caller's sink)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Caller-supplied EventSink implementations
//! ```
//!
//! # Design Decisions
//! - Event sinks are fire-and-forget: a sink can never fail a request
//! - Metrics are cheap (atomic increments behind the metrics facade)
//! - Logging setup is optional; embedding applications own the subscriber

pub mod events;
pub mod logging;
pub mod metrics;
