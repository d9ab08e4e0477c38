//! Metrics collection and exposition.
//!
//! # Metrics
//! - `csi_requests_total` (counter): calls by method and outcome
//! - `csi_request_duration_seconds` (histogram): call latency by method
//!
//! # Design Decisions
//! - Outcome label is `ok` or the error code, so rejected calls are counted
//! - The Prometheus listener is only started when an address is configured

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed call.
pub fn record_call(method: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "csi_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "csi_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}
