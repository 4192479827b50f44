//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_rate_limited_total` (counter): requests rejected by the rate limiter
//! - `guard_auth_failures_total` (counter): authentication failures by reason
//! - `guard_denied_total` (counter): guard rejections by reason
//! - `guard_panics_total` (counter): requests that ended in a caught panic
//! - `guard_evicted_clients_total` (counter): idle clients removed by the janitor
//! - `guard_tracked_clients` (gauge): clients in the rate limit registry

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited() {
    counter!("guard_rate_limited_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("guard_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_guard_denied(reason: &'static str) {
    counter!("guard_denied_total", "reason" => reason).increment(1);
}

pub fn record_panic() {
    counter!("guard_panics_total").increment(1);
}

pub fn record_sweep(evicted: usize, remaining: usize) {
    counter!("guard_evicted_clients_total").increment(evicted as u64);
    gauge!("guard_tracked_clients").set(remaining as f64);
}
