//! Server errors.

use cfgate_router::RouteError;
use thiserror::Error;

/// Failures while assembling or running the server.
///
/// Request-level failures never surface here; they are rendered as
/// [`ApiError`](cfgate_core::ApiError) envelopes.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address does not parse.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address being bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Two route sets registered the same method and pattern, or a pattern is
    /// invalid.
    #[error("route registration failed: {0}")]
    Route(#[from] RouteError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_display() {
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            reason: "invalid socket address syntax".to_string(),
        };
        assert!(err.to_string().contains("invalid address 'nope'"));

        let err: ServerError = RouteError::Duplicate {
            method: Method::GET,
            pattern: "/v3".to_string(),
        }
        .into();
        assert!(err.to_string().contains("GET /v3 is already registered"));
    }
}
