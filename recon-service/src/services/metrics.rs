//! Prometheus metrics for recon-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Encoder,
    Histogram, HistogramVec, TextEncoder,
};

/// Counter for database query duration.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recon_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Counter for per-transaction match outcomes.
pub static MATCH_OUTCOMES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_match_outcomes_total",
        "Total number of per-transaction match outcomes",
        &["status"]
    )
    .expect("Failed to register MATCH_OUTCOMES")
});

/// Histogram for match batch sizes.
pub static MATCH_BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "recon_match_batch_size",
        "Number of statement rows per match request",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]
    )
    .expect("Failed to register MATCH_BATCH_SIZE")
});

/// Counter for match confirmations.
pub static CONFIRMATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_confirmations_total",
        "Total number of match confirmation attempts",
        &["status"]
    )
    .expect("Failed to register CONFIRMATIONS")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recon_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&MATCH_OUTCOMES);
    Lazy::force(&MATCH_BATCH_SIZE);
    Lazy::force(&CONFIRMATIONS);
    Lazy::force(&ERRORS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a per-transaction match outcome.
pub fn record_match_outcome(status: &str) {
    MATCH_OUTCOMES.with_label_values(&[status]).inc();
}

/// Record the size of a match batch.
pub fn record_batch_size(size: usize) {
    MATCH_BATCH_SIZE.observe(size as f64);
}

/// Record a match confirmation attempt.
pub fn record_confirmation(status: &str) {
    CONFIRMATIONS.with_label_values(&[status]).inc();
}

/// Record an error.
pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}
