//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for standalone use
//! - Respect `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Embedding applications usually own the subscriber; this init is a
//!   convenience and is safe to call more than once

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a tracing subscriber with an env-filter.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"resilient_client=debug"`. Repeated calls are no-ops.
pub fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
