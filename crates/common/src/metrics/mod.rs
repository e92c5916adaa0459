//! Metrics and observability utilities
//!
//! Metric descriptions plus small recording helpers used by the chat
//! pipeline, the provider layer and the property store.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all PropPilot metrics
pub const METRICS_PREFIX: &str = "proppilot";

/// Histogram buckets for provider and pipeline latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00, 60.00,
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
        format!("{}_chat_messages_total", METRICS_PREFIX),
        Unit::Count,
        "Chat messages handled, by outcome"
    );

    describe_histogram!(
        format!("{}_pipeline_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end chat pipeline latency in seconds"
    );

    describe_counter!(
        format!("{}_extractions_total", METRICS_PREFIX),
        Unit::Count,
        "Criteria extractions, by outcome"
    );

    describe_counter!(
        format!("{}_syntheses_total", METRICS_PREFIX),
        Unit::Count,
        "Response syntheses, by outcome"
    );

    describe_counter!(
        format!("{}_provider_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Text-completion provider requests"
    );

    describe_counter!(
        format!("{}_provider_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Text-completion provider errors"
    );

    describe_histogram!(
        format!("{}_provider_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Text-completion provider latency in seconds"
    );

    describe_histogram!(
        format!("{}_store_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Property store query latency in seconds"
    );

    describe_gauge!(
        format!("{}_store_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of records returned by the last store query"
    );

    describe_gauge!(
        format!("{}_context_sessions", METRICS_PREFIX),
        Unit::Count,
        "Sessions with retained conversation context"
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

/// Record a completed chat pipeline run
pub fn record_pipeline(duration_secs: f64, provider: &str, outcome: &str) {
    counter!(
        format!("{}_chat_messages_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_pipeline_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string()
    )
    .record(duration_secs);
}

/// Record a criteria extraction outcome: `extracted`, `empty` or `failed`
pub fn record_extraction(provider: &str, outcome: &str) {
    counter!(
        format!("{}_extractions_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a response synthesis outcome: `results`, `no_results` or `fallback`
pub fn record_synthesis(provider: &str, outcome: &str) {
    counter!(
        format!("{}_syntheses_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a provider call
pub fn record_provider(duration_secs: f64, provider: &str, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_provider_requests_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_provider_duration_seconds", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_provider_errors_total", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .increment(1);
    }
}

/// Record a store query
pub fn record_store_query(duration_secs: f64, backend: &str, result_count: usize) {
    histogram!(
        format!("{}_store_query_duration_seconds", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_store_results_count", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .set(result_count as f64);
}

/// Record the number of sessions holding context
pub fn record_context_sessions(sessions: usize) {
    gauge!(format!("{}_context_sessions", METRICS_PREFIX)).set(sessions as f64);
}
