//! Prometheus metrics for the wallet ledger.
//!
//! All metrics follow the naming convention: `wallet_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., invocations_total)
//! - **Histogram**: Distribution of values (e.g., invocation_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCHER METRICS
    // =========================================================================

    /// Invocations by operation and outcome
    pub static ref INVOCATIONS: CounterVec = CounterVec::new(
        Opts::new("wallet_ledger_invocations_total", "Ledger invocations by operation and outcome"),
        &["operation", "outcome"]  // outcome: success/invalid_argument/unauthorized/insufficient_funds/state
    ).expect("metric creation failed");

    /// Invocation duration histogram
    pub static ref INVOCATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "wallet_ledger_invocation_duration_seconds",
            "Time spent executing a ledger operation"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).unwrap()),
        &["operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // AUTHORIZATION METRICS
    // =========================================================================

    /// Mutating calls rejected by the authorization gate
    pub static ref UNAUTHORIZED_REJECTIONS: Counter = Counter::new(
        "wallet_auth_unauthorized_total",
        "Mutating operations rejected because the caller is not an administrator"
    ).expect("metric creation failed");

    // =========================================================================
    // RUNTIME METRICS
    // =========================================================================

    /// Commits rejected by read-version validation
    pub static ref COMMIT_CONFLICTS: Counter = Counter::new(
        "wallet_runtime_commit_conflicts_total",
        "Invocations whose writes were discarded because a read key changed before commit"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error; already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatcher
        Box::new(INVOCATIONS.clone()),
        Box::new(INVOCATION_DURATION.clone()),
        // Authorization
        Box::new(UNAUTHORIZED_REJECTIONS.clone()),
        // Runtime
        Box::new(COMMIT_CONFLICTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a new timer for one label of [`INVOCATION_DURATION`].
    pub fn for_operation(operation: &str) -> Self {
        Self::new(&INVOCATION_DURATION.with_label_values(&[operation]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_counter_increment() {
        let before = INVOCATIONS.with_label_values(&["load", "success"]).get();
        INVOCATIONS.with_label_values(&["load", "success"]).inc();
        assert!(INVOCATIONS.with_label_values(&["load", "success"]).get() >= before + 1.0);
    }

    #[test]
    fn test_histogram_timer() {
        let histogram = INVOCATION_DURATION.with_label_values(&["queryBalance"]);
        let before = histogram.get_sample_count();
        {
            let _timer = HistogramTimer::for_operation("queryBalance");
        }
        assert!(histogram.get_sample_count() > before);
    }

    #[test]
    fn test_encode_contains_registered_metric() {
        register_metrics().unwrap();
        COMMIT_CONFLICTS.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("wallet_runtime_commit_conflicts_total"));
    }
}
