//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): proxied requests by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): latency by outcome
//! - `relay_replays_total` (counter): replays by result
//! - `relay_log_entries` (gauge): retained log entries

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one proxied exchange.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_replay(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("relay_replays_total", "result" => result).increment(1);
}

pub fn record_log_size(len: usize) {
    metrics::gauge!("relay_log_entries").set(len as f64);
}
