use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
};

/// Metrics recorded by the batch pipeline
pub struct BatchMetrics {
    pub transactions_sent: IntCounterVec,
    pub accounts_finished: IntCounterVec,
    pub nonce_convergence_duration: HistogramVec,
}

impl BatchMetrics {
    /// Create new batch metrics with the provided registry
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let transactions_sent = register_int_counter_vec_with_registry!(
            Opts::new(
                "inscribe_transactions_sent_total",
                "Transactions accepted by the ledger node"
            ),
            &["profile"],
            registry
        )?;

        let accounts_finished = register_int_counter_vec_with_registry!(
            Opts::new(
                "inscribe_accounts_finished_total",
                "Account tasks that finished, by final status"
            ),
            &["profile", "status"],
            registry
        )?;

        let nonce_convergence_duration = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "inscribe_nonce_convergence_duration_seconds",
                "Time from broadcast until the node's pending nonce caught up"
            )
            .buckets(vec![3.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0]),
            &["profile"],
            registry
        )?;

        Ok(BatchMetrics {
            transactions_sent,
            accounts_finished,
            nonce_convergence_duration,
        })
    }
}

lazy_static! {
    static ref DEFAULT_BATCH_METRICS_REGISTRY: Registry = Registry::new();

    static ref DEFAULT_BATCH_METRICS: BatchMetrics =
        BatchMetrics::new(&DEFAULT_BATCH_METRICS_REGISTRY)
            .expect("Failed to create default batch metrics");
}

/// Export metrics in Prometheus text format from the default registry
pub fn export_default_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let encoder = TextEncoder::new();
    let metric_families = DEFAULT_BATCH_METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_transaction_sent(profile: &str) {
    DEFAULT_BATCH_METRICS
        .transactions_sent
        .with_label_values(&[profile])
        .inc();
}

pub fn record_account_finished(profile: &str, status: &str) {
    DEFAULT_BATCH_METRICS
        .accounts_finished
        .with_label_values(&[profile, status])
        .inc();
}

pub fn record_nonce_convergence(profile: &str, duration_seconds: f64) {
    DEFAULT_BATCH_METRICS
        .nonce_convergence_duration
        .with_label_values(&[profile])
        .observe(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_metrics_registry() {
        let custom_registry = Registry::new();
        let custom_metrics =
            BatchMetrics::new(&custom_registry).expect("Should create custom metrics");

        // Registering the same names twice in one registry must fail.
        assert!(BatchMetrics::new(&custom_registry).is_err());

        custom_metrics
            .transactions_sent
            .with_label_values(&["async_mint"])
            .inc_by(3);
        custom_metrics
            .accounts_finished
            .with_label_values(&["async_mint", "insufficient_funds"])
            .inc();

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&custom_registry.gather(), &mut buffer)
            .expect("Should encode metrics");
        let output = String::from_utf8(buffer).expect("Should convert to string");

        assert!(output.contains("inscribe_transactions_sent_total{profile=\"async_mint\"} 3"));
        assert!(output.contains("insufficient_funds"));
    }

    #[test]
    fn test_default_registry_export() {
        record_transaction_sent("mint");
        record_account_finished("mint", "completed");
        record_nonce_convergence("mint", 8.0);

        let output = export_default_metrics().expect("Should export default metrics");
        assert!(output.contains("inscribe_transactions_sent_total"));
        assert!(output.contains("inscribe_accounts_finished_total"));
        assert!(output.contains("inscribe_nonce_convergence_duration_seconds"));
    }
}
