//! Prometheus metrics exposition
//!
//! - `review_requests_total` (counter): label `status`
//! - `review_request_duration_seconds` (histogram): label `status`
//! - `review_failures_total` (counter): label `kind`
//!
//! The credential pool emits `generation_attempts_total{outcome}` and
//! `credential_rotations_total` through the same recorder.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Histogram buckets from 5ms to 120s. A review spans up to one timed-out
/// attempt per credential, so the tail is longer than a single call.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("review_request_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a completed review request.
pub fn record_request(status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("review_requests_total", "status" => status_str.clone()).increment(1);
    metrics::histogram!("review_request_duration_seconds", "status" => status_str)
        .record(duration_secs);
}

/// Record a failed review with its caller-facing error kind.
pub fn record_review_failure(kind: &'static str) {
    metrics::counter!("review_failures_total", "kind" => kind).increment(1);
}
