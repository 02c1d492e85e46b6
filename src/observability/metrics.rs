//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_cache_entries` (gauge): current cache size
//! - `client_cache_evictions_total` (counter): capacity evictions
//! - `client_rate_limited_total` (counter): admission denials by strategy
//! - `client_retries_total` (counter): retry attempts scheduled
//! - `client_retry_budget_exhausted_total` (counter): budget denials
//! - `client_queue_depth` (gauge): queued items
//! - `client_queue_rejected_total` (counter): queue-full rejections
//! - `client_tasks_total` (counter): finished tasks by outcome
//!
//! # Design Decisions
//! - Thin wrappers over the `metrics` facade; a host without a recorder
//!   installed pays near-zero cost
//! - `init_metrics` is optional and installs a Prometheus scrape endpoint

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Call at most once per process; embedding applications that already
/// install a recorder should skip this.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(error) => tracing::error!(%error, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("client_cache_entries").set(entries as f64);
}

pub fn record_cache_eviction() {
    metrics::counter!("client_cache_evictions_total").increment(1);
}

pub fn record_rate_limited(strategy: &'static str) {
    metrics::counter!("client_rate_limited_total", "strategy" => strategy).increment(1);
}

pub fn record_retry() {
    metrics::counter!("client_retries_total").increment(1);
}

pub fn record_retry_budget_exhausted() {
    metrics::counter!("client_retry_budget_exhausted_total").increment(1);
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("client_queue_depth").set(depth as f64);
}

pub fn record_queue_rejected() {
    metrics::counter!("client_queue_rejected_total").increment(1);
}

pub fn record_task_finished(failed: bool) {
    let outcome = if failed { "failed" } else { "completed" };
    metrics::counter!("client_tasks_total", "outcome" => outcome).increment(1);
}
