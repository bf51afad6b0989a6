//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_requests_total` (counter): requests by method, status, view
//! - `site_request_duration_seconds` (histogram): latency by view

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request. `view` is the view name, or
/// `"redirect"` / `"not_found"` when no route answered.
pub fn record_request(method: &str, status: u16, view: &'static str, start: Instant) {
    metrics::counter!(
        "site_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "view" => view
    )
    .increment(1);

    metrics::histogram!("site_request_duration_seconds", "view" => view)
        .record(start.elapsed().as_secs_f64());
}
