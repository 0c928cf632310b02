//! Telemetry setup errors.

use thiserror::Error;

/// Logging or metrics could not be started.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Bad filter directive, or a subscriber was already installed.
    #[error("cannot install log subscriber: {0}")]
    Subscriber(String),

    /// The Prometheus recorder or its listener could not be installed.
    #[error("cannot start metrics exporter: {0}")]
    Exporter(String),

    /// `metrics.addr` is not a socket address.
    #[error("bad metrics listen address {addr:?}: {reason}")]
    ListenAddr {
        /// The configured value.
        addr: String,
        /// Parser message.
        reason: String,
    },
}
