//! Client metrics.
//!
//! Hermes records through the [`metrics`] facade; installing a recorder
//! (Prometheus, statsd, ...) is up to the application. Without one, every
//! call here is a no-op.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `hermes_client_invocations_total` | Counter | `service`, `operation`, `outcome` |
//! | `hermes_client_errors_total` | Counter | `service`, `operation`, `kind` |
//! | `hermes_client_duration_seconds` | Histogram | `service`, `operation` |
//! | `hermes_waiter_attempts_total` | Counter | `service`, `waiter`, `state` |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Completed invocations.
pub const INVOCATIONS_TOTAL: &str = "hermes_client_invocations_total";

/// Failed invocations by error kind.
pub const ERRORS_TOTAL: &str = "hermes_client_errors_total";

/// Invocation latency.
pub const DURATION_SECONDS: &str = "hermes_client_duration_seconds";

/// Waiter attempts by resulting state.
pub const WAITER_ATTEMPTS_TOTAL: &str = "hermes_waiter_attempts_total";

/// Registers descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(INVOCATIONS_TOTAL, "Total client invocations by outcome");
    describe_counter!(ERRORS_TOTAL, "Total failed client invocations by error kind");
    describe_histogram!(DURATION_SECONDS, "Client invocation duration in seconds");
    describe_counter!(WAITER_ATTEMPTS_TOTAL, "Total waiter attempts by resulting state");
}

/// Records one finished invocation.
///
/// `error_kind` is `None` for a successful call.
pub fn record_invocation(
    service: &str,
    operation: &str,
    error_kind: Option<&'static str>,
    duration: Duration,
) {
    let outcome = if error_kind.is_some() { "error" } else { "success" };
    counter!(
        INVOCATIONS_TOTAL,
        "service" => service.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        DURATION_SECONDS,
        "service" => service.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    if let Some(kind) = error_kind {
        counter!(
            ERRORS_TOTAL,
            "service" => service.to_string(),
            "operation" => operation.to_string(),
            "kind" => kind
        )
        .increment(1);
    }
}

/// Records one waiter attempt and the state it produced.
pub fn record_waiter_attempt(service: &str, waiter: &str, state: &'static str) {
    counter!(
        WAITER_ATTEMPTS_TOTAL,
        "service" => service.to_string(),
        "waiter" => waiter.to_string(),
        "state" => state
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder() {
        describe_metrics();
        record_invocation("Storage", "GetObject", None, Duration::from_millis(12));
        record_invocation("Storage", "GetObject", Some("api"), Duration::from_millis(3));
        record_waiter_attempt("Storage", "ObjectExists", "retry");
    }

    #[test]
    fn test_metric_names() {
        assert!(INVOCATIONS_TOTAL.starts_with("hermes_client_"));
        assert!(WAITER_ATTEMPTS_TOTAL.ends_with("_total"));
    }
}
