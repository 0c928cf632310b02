//! Observability for cfgate.
//!
//! - **Logging**: JSON or pretty `tracing` output, see [`logging`]
//! - **Metrics**: request counters and latency histograms with an optional
//!   Prometheus exporter, see [`metrics`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cfgate_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::json("info"), &MetricsConfig::default())?;
//! ```

#![doc(html_root_url = "https://docs.rs/cfgate-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{
    init_metrics, record_cf_user_warning, record_cli_version_rejection, record_request,
    render_metrics, InFlightGuard, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initialises logging, then metrics.
///
/// # Errors
///
/// Returns the first initialisation failure.
pub fn init_telemetry(log: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(log)?;
    init_metrics(metrics)?;
    Ok(())
}
