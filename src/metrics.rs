use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder as the global metrics sink
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    // Fails if a recorder is already installed
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    // Request side: one of received/rejected per POST
    describe_counter!(
        "perflog_logs_received_total",
        "Log lines accepted by the validator"
    );
    describe_counter!(
        "perflog_logs_rejected_total",
        "Log lines rejected by the validator"
    );
    // Background side: one of stored/failures per accepted line
    describe_counter!(
        "perflog_logs_stored_total",
        "Records written by background jobs"
    );
    describe_counter!(
        "perflog_background_failures_total",
        "Background jobs that dropped their record"
    );
    describe_histogram!(
        "perflog_background_duration_seconds",
        "Time from dispatch to a completed store write"
    );
    describe_gauge!(
        "perflog_gateway_info",
        "Gateway version and build information"
    );

    // Set gateway info metric
    gauge!("perflog_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record an accepted line. Service names are matched case-insensitively, so
/// the label is lowercased to keep one series per service.
pub fn record_received(service: &str) {
    counter!("perflog_logs_received_total", "service" => service.to_lowercase()).increment(1);
}

pub fn record_rejected(kind: &'static str) {
    counter!("perflog_logs_rejected_total", "kind" => kind).increment(1);
}

/// Record a completed write and how long the job took since dispatch
pub fn record_stored(backend: &'static str, duration: Duration) {
    counter!("perflog_logs_stored_total", "backend" => backend).increment(1);
    histogram!("perflog_background_duration_seconds", "backend" => backend)
        .record(duration.as_secs_f64());
}

/// `stage` is one of `queue`, `transform`, `store`
pub fn record_background_failure(stage: &'static str) {
    counter!("perflog_background_failures_total", "stage" => stage).increment(1);
}
