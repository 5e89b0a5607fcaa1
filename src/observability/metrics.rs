//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (requests, latency, redirects, upstream errors, streams)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `relay_requests_total` (counter): inbound requests by response status
//! - `relay_request_duration_seconds` (histogram): time until the response head
//! - `relay_redirects_total` (counter): redirect hops followed
//! - `relay_upstream_errors_total` (counter): failures by error kind
//! - `relay_active_streams` (gauge): bodies currently being copied
//!
//! # Design Decisions
//! - Updates go through the `metrics` facade; without an installed
//!   recorder they are no-ops, so tests need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("relay_requests_total", "Inbound relay requests by response status");
    describe_histogram!(
        "relay_request_duration_seconds",
        "Time from request arrival until the response head is ready"
    );
    describe_counter!("relay_redirects_total", "Redirect hops followed");
    describe_counter!("relay_upstream_errors_total", "Relay failures by kind");
    describe_gauge!("relay_active_streams", "Response bodies currently streaming");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request head.
pub fn record_request(status: u16, start_time: Instant) {
    counter!("relay_requests_total", "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

pub fn record_redirect() {
    counter!("relay_redirects_total").increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}

/// Keeps `relay_active_streams` raised while alive.
#[derive(Debug)]
pub struct ActiveStream {
    _private: (),
}

impl ActiveStream {
    pub fn start() -> Self {
        gauge!("relay_active_streams").increment(1.0);
        Self { _private: () }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        gauge!("relay_active_streams").decrement(1.0);
    }
}
