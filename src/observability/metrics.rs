//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dns_failover_checks_total` (counter): probe attempts by outcome
//! - `dns_failover_check_duration_seconds` (histogram): attempt latency
//! - `dns_failover_server_health` (gauge): 1=healthy, 0=unhealthy
//! - `dns_failover_record_changes_total` (counter): add/delete by domain and result
//! - `dns_failover_records` (gauge): record count per domain at read time
//! - `dns_failover_registry_read_errors_total` (counter): failed record reads
//! - `dns_failover_tick_duration_seconds` (histogram): full round latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::CheckOutcome;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record one bounded probe attempt.
pub fn record_check(outcome: CheckOutcome, duration: Duration) {
    counter!("dns_failover_checks_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("dns_failover_check_duration_seconds").record(duration.as_secs_f64());
}

/// Record the verdict for a server after retries.
pub fn record_server_health(server: &str, healthy: bool) {
    gauge!("dns_failover_server_health", "server" => server.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Kind of record mutation.
#[derive(Debug, Clone, Copy)]
pub enum RecordChange {
    Add,
    Delete,
}

impl RecordChange {
    fn as_str(self) -> &'static str {
        match self {
            RecordChange::Add => "add",
            RecordChange::Delete => "delete",
        }
    }
}

/// Record an attempted record mutation.
pub fn record_change(domain: &str, change: RecordChange, success: bool) {
    counter!(
        "dns_failover_record_changes_total",
        "domain" => domain.to_string(),
        "operation" => change.as_str(),
        "result" => if success { "success" } else { "error" }
    )
    .increment(1);
}

/// Record the size of a freshly read record set.
pub fn record_record_count(domain: &str, count: usize) {
    gauge!("dns_failover_records", "domain" => domain.to_string()).set(count as f64);
}

/// Record a failed record set read.
pub fn record_read_error(domain: &str) {
    counter!("dns_failover_registry_read_errors_total", "domain" => domain.to_string())
        .increment(1);
}

/// Record how long one full round took.
pub fn record_tick(duration: Duration) {
    histogram!("dns_failover_tick_duration_seconds").record(duration.as_secs_f64());
}
