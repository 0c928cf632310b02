//! Log subscriber setup.
//!
//! The gateway logs through `tracing`. In production every event is one JSON
//! object carrying the fields of its enclosing `request` span (so each line
//! has the `correlation_id`); locally a pretty multi-line layout is easier to
//! read. The level is a full `EnvFilter` directive, so
//! `info,cfgate_middleware=debug` works.
//!
//! ```rust,ignore
//! use cfgate_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::pretty("debug"))?;
//! tracing::info!(correlation_id = "abc", "gateway started");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive.
    pub level: String,
    /// JSON lines instead of the pretty layout.
    pub json: bool,
    /// Also log span open and close.
    pub span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::json("info")
    }
}

impl LogConfig {
    /// JSON lines, no span events.
    #[must_use]
    pub fn json(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: true,
            span_events: false,
        }
    }

    /// Pretty output with span open and close events.
    #[must_use]
    pub fn pretty(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
            span_events: true,
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::Subscriber` for an invalid filter or when a
/// global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer().with_span_events(span_events);
    let layer = if config.json {
        layer.json().with_current_span(true).with_span_list(false).boxed()
    } else {
        layer.pretty().with_file(true).with_line_number(true).boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns `TelemetryError::Subscriber` if the directive is invalid.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::Subscriber(format!("bad filter {directive:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_json_info() {
        assert_eq!(LogConfig::default(), LogConfig::json("info"));
        assert!(!LogConfig::default().span_events);
    }

    #[test]
    fn test_pretty_logs_spans() {
        let config = LogConfig::pretty("debug");
        assert!(!config.json);
        assert!(config.span_events);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info,cfgate_server=debug").is_ok());
        let err = create_env_filter("cfgate=notalevel").unwrap_err();
        assert!(err.to_string().contains("cfgate=notalevel"));
    }

    #[test]
    fn test_invalid_filter_fails_before_install() {
        let err = init_logging(&LogConfig::json("[")).unwrap_err();
        assert!(matches!(err, TelemetryError::Subscriber(_)));
    }
}
