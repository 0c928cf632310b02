//! Prometheus metrics for cfgate.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `cfgate_requests_total` | Counter | `method`, `status` | Completed requests |
//! | `cfgate_request_duration_seconds` | Histogram | `method` | Request latency |
//! | `cfgate_in_flight_requests` | Gauge | - | Requests being processed |
//! | `cfgate_cf_user_warnings_total` | Counter | - | Responses carrying the no-roles warning |
//! | `cfgate_cli_version_rejections_total` | Counter | - | Requests refused by the CLI version gate |
//!
//! Recording functions are safe to call before [`init_metrics`]; without an
//! installed recorder they are no-ops.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the exporter is started.
    pub enabled: bool,

    /// Listen address of the `/metrics` endpoint.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// # Errors
///
/// `TelemetryError::ListenAddr` for an unparsable address and
/// `TelemetryError::Exporter` when the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e: std::net::AddrParseError| TelemetryError::ListenAddr {
            addr: config.addr.clone(),
            reason: e.to_string(),
        })?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}

/// Renders metrics in Prometheus text format, if initialised.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!("cfgate_requests_total", "Total number of HTTP requests processed");
    describe_histogram!(
        "cfgate_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "cfgate_in_flight_requests",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "cfgate_cf_user_warnings_total",
        "Responses warned that the caller holds no CF role"
    );
    describe_counter!(
        "cfgate_cli_version_rejections_total",
        "Requests rejected for an unsupported cf CLI version"
    );
}

/// Records a completed request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        "cfgate_requests_total",
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "cfgate_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Counts a response decorated with the no-roles warning.
pub fn record_cf_user_warning() {
    counter!("cfgate_cf_user_warnings_total").increment(1);
}

/// Counts a request refused by the CLI version gate.
pub fn record_cli_version_rejection() {
    counter!("cfgate_cli_version_rejections_total").increment(1);
}

/// Keeps `cfgate_in_flight_requests` raised while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("cfgate_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("cfgate_in_flight_requests").decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
    }

    #[test]
    fn test_disabled_init_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-addr".to_string(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::ListenAddr { .. })
        ));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_request("GET", 200, Duration::from_millis(10));
        record_cf_user_warning();
        record_cli_version_rejection();
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
