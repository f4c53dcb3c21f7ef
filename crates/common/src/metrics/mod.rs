//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all FitCore metrics
pub const METRICS_PREFIX: &str = "fitcore";

/// SLO-aligned histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_plan_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total AI plan requests"
    );

    describe_histogram!(
        format!("{}_plan_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "AI plan request latency in seconds"
    );

    describe_counter!(
        format!("{}_kb_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total knowledge-base queries"
    );

    describe_histogram!(
        format!("{}_kb_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Knowledge-base query latency in seconds"
    );

    describe_gauge!(
        format!("{}_kb_chunks_indexed", METRICS_PREFIX),
        Unit::Count,
        "Number of chunks in the current KB index"
    );

    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_counter!(
        format!("{}_audit_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Audit entries dropped or failed to persist"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record an AI plan round trip
pub fn record_plan(duration_secs: f64, action_count: usize, error_count: usize) {
    counter!(
        format!("{}_plan_requests_total", METRICS_PREFIX),
        "outcome" => if error_count == 0 { "clean" } else { "with_errors" }
    )
    .increment(1);

    histogram!(format!("{}_plan_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    counter!(format!("{}_plan_actions_total", METRICS_PREFIX)).increment(action_count as u64);
}

/// Helper to record a knowledge-base query
pub fn record_kb_query(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_kb_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_kb_query_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_kb_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record a KB re-index
pub fn record_kb_reindex(chunks_indexed: usize) {
    gauge!(format!("{}_kb_chunks_indexed", METRICS_PREFIX)).set(chunks_indexed as f64);
}

/// Helper to record audit failures; `kind` is "dropped" or "write"
pub fn record_audit_failure(kind: &str) {
    counter!(
        format!("{}_audit_failures_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/api/ai/plan");
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
