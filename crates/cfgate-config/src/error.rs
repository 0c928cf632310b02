//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a [`GatewayConfig`](crate::GatewayConfig) could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required config file does not exist.
    #[error("config file {path} does not exist")]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A config file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// The offending file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a key no section declares.
    #[error("bad TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a key no section declares.
    #[error("bad JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML, or a key no section declares.
    #[error("bad YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Neither `.toml`, `.json`, `.yaml` nor `.yml`.
    #[error("config format not supported: {0}")]
    UnsupportedFormat(String),

    /// A value parsed but is not usable, e.g. an unparsable `cli.min_version`.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `CFGATE__SECTION__KEY` override could not be applied.
    #[error("environment override {var} rejected: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// A value that failed [`GatewayConfig::validate`](crate::GatewayConfig::validate).
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::missing("/etc/cfgate/config.toml");
        assert_eq!(err.to_string(), "config file /etc/cfgate/config.toml does not exist");

        let err = ConfigError::invalid_value("cli.min_version", "not a semantic version");
        assert_eq!(err.to_string(), "cli.min_version: not a semantic version");

        let err = ConfigError::env("CFGATE__JOBS__DELETION_TIMEOUT_SECS", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment override CFGATE__JOBS__DELETION_TIMEOUT_SECS rejected: expected integer"
        );
    }

    #[test]
    fn test_read_keeps_io_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read("/etc/cfgate/config.toml", io);
        assert!(err.source().is_some());
    }
}
