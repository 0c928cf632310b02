//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{AuthConfig, CliConfig, ConfigError, JobsConfig, LoggingConfig, MetricsConfig, ServerConfig};

/// Complete gateway configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to build one from files and the
/// environment.
///
/// # Example
///
/// ```
/// use cfgate_config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.auth.root_namespace, "cf");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listener and request limits.
    #[serde(default)]
    pub server: ServerConfig,

    /// CF-user role lookup.
    #[serde(default)]
    pub auth: AuthConfig,

    /// CLI version gate.
    #[serde(default)]
    pub cli: CliConfig,

    /// Job status reporting.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GatewayConfig {
    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if !(self.server.server_url.starts_with("http://")
            || self.server.server_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid_value(
                "server.server_url",
                format!("expected an http(s) URL: {}", self.server.server_url),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.auth.root_namespace.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "auth.root_namespace",
                "cannot be blank",
            ));
        }

        if let Err(e) = semver::Version::parse(&self.cli.min_version) {
            return Err(ConfigError::invalid_value(
                "cli.min_version",
                format!("not a semantic version: {e}"),
            ));
        }

        if let Err(e) = cfgate_telemetry::logging::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self.metrics.enabled
            && self
                .metrics
                .addr
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// `server.server_url` without a trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        self.server.server_url.trim_end_matches('/')
    }
}
