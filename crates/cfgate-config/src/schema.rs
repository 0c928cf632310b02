//! Configuration schema types.
//!
//! One struct per section. Every section rejects unknown keys and fills
//! missing keys from its defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[server]`: listener, public URL and request limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g. `0.0.0.0:8080`).
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Externally visible base URL used in links.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Upper bound on handler execution.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Drain period for in-flight connections on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shutdown drain timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            server_url: default_server_url(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_server_url() -> String {
    "https://localhost".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// `[auth]`: role lookup for the CF-user check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Namespace whose role bindings mark a caller as a CF user.
    #[serde(default = "default_root_namespace")]
    pub root_namespace: String,

    /// How long a positive CF-user result is remembered.
    #[serde(default = "default_cf_user_cache_ttl")]
    pub cf_user_cache_ttl_secs: u64,
}

impl AuthConfig {
    /// Cache TTL as a [`Duration`].
    #[must_use]
    pub fn cf_user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cf_user_cache_ttl_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            root_namespace: default_root_namespace(),
            cf_user_cache_ttl_secs: default_cf_user_cache_ttl(),
        }
    }
}

fn default_root_namespace() -> String {
    "cf".to_string()
}

fn default_cf_user_cache_ttl() -> u64 {
    120
}

/// `[cli]`: the supported cf CLI range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Lowest accepted CLI version.
    #[serde(default = "default_min_cli_version")]
    pub min_version: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            min_version: default_min_cli_version(),
        }
    }
}

fn default_min_cli_version() -> String {
    "8.5.0".to_string()
}

/// `[jobs]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Age after which a pending deletion is reported as failed.
    #[serde(default = "default_deletion_timeout")]
    pub deletion_timeout_secs: u64,
}

impl JobsConfig {
    /// Deletion timeout as a [`Duration`].
    #[must_use]
    pub fn deletion_timeout(&self) -> Duration {
        Duration::from_secs(self.deletion_timeout_secs)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            deletion_timeout_secs: default_deletion_timeout(),
        }
    }
}

fn default_deletion_timeout() -> u64 {
    120
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `info,cfgate_middleware=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Converts into the subscriber settings used by `cfgate-telemetry`.
    #[must_use]
    pub fn to_log_config(&self) -> cfgate_telemetry::LogConfig {
        match self.format {
            LogFormat::Json => cfgate_telemetry::LogConfig::json(&self.level),
            LogFormat::Pretty => cfgate_telemetry::LogConfig::pretty(&self.level),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[metrics]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Exporter listen address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl MetricsConfig {
    /// Converts into the exporter settings used by `cfgate-telemetry`.
    #[must_use]
    pub fn to_metrics_config(&self) -> cfgate_telemetry::MetricsConfig {
        cfgate_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
