//! # Wallet Telemetry
//!
//! Observability for the custody wallet ledger.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters and histograms for ledger invocations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wallet_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Ledger invocations are now logged and counted
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `custody-wallet` | Service name attached to logs |
//! | `WALLET_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `WALLET_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `WALLET_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, COMMIT_CONFLICTS,
    INVOCATIONS, INVOCATION_DURATION, UNAUTHORIZED_REJECTIONS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration value could not be used.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the host process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_tracing(config)?;

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
