use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::model::Outcome;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests by terminal outcome. Labels: outcome.
pub const BOOKINGS_TOTAL: &str = "boxoffice_bookings_total";

/// Histogram: time spent waiting on the capacity gate, in seconds.
pub const ACQUIRE_WAIT_SECONDS: &str = "boxoffice_acquire_wait_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: unreserved capacity.
pub const TICKETS_REMAINING: &str = "boxoffice_tickets_remaining";

/// Counter: tickets handed out.
pub const TICKETS_ALLOCATED_TOTAL: &str = "boxoffice_tickets_allocated_total";

/// Counter: partial allocations undone after cancellation or a pool shortfall.
pub const ROLLBACKS_TOTAL: &str = "boxoffice_rollbacks_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map an Outcome to a short label for metrics.
pub fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "success",
        Outcome::ValidationError => "validation_error",
        Outcome::ClosedWindow => "closed_window",
        Outcome::CapacityTimeout => "capacity_timeout",
        Outcome::Cancelled => "cancelled",
        Outcome::InternalError => "internal_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_serde_names() {
        for outcome in [
            Outcome::Success,
            Outcome::ValidationError,
            Outcome::ClosedWindow,
            Outcome::CapacityTimeout,
            Outcome::Cancelled,
            Outcome::InternalError,
        ] {
            let json = serde_json::to_string(&outcome).unwrap();
            assert_eq!(json.trim_matches('"'), outcome_label(outcome));
        }
    }

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
    }
}
