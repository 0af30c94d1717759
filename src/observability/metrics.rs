//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_invocations_total` (counter): invocations by aggregated outcome
//! - `health_invocation_duration_seconds` (histogram): invocation latency
//! - `health_procedure_duration_seconds` (histogram): single procedure latency
//! - `health_procedure_failures_total` (counter): faults by kind
//! - `health_registered_procedures` (gauge): procedures in the registry
//! - `health_http_responses_total` (counter): boundary responses by status
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::checks::{Outcome, ProcedureFault};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_invocation(outcome: Outcome, started: Instant) {
    metrics::counter!("health_invocations_total", "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!("health_invocation_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn record_procedure(started: Instant, fault: Option<&ProcedureFault>) {
    metrics::histogram!("health_procedure_duration_seconds")
        .record(started.elapsed().as_secs_f64());
    if let Some(fault) = fault {
        metrics::counter!("health_procedure_failures_total", "kind" => fault.as_label())
            .increment(1);
    }
}

/// Move the registered-procedures gauge by `delta`.
///
/// Deltas commute, so writers publishing concurrently cannot leave a stale
/// absolute value behind.
pub fn adjust_registered_procedures(delta: i64) {
    let gauge = metrics::gauge!("health_registered_procedures");
    if delta >= 0 {
        gauge.increment(delta as f64);
    } else {
        gauge.decrement(delta.unsigned_abs() as f64);
    }
}

pub fn record_http_response(status: u16) {
    metrics::counter!("health_http_responses_total", "status" => status.to_string()).increment(1);
}
