//! Route registration errors.

use http::Method;
use thiserror::Error;

/// Errors raised while building a [`Router`](crate::Router).
///
/// Matching never fails; only registration does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same method and pattern were registered twice.
    #[error("route {method} {pattern} is already registered")]
    Duplicate {
        /// HTTP method of the rejected route.
        method: Method,
        /// Path pattern of the rejected route.
        pattern: String,
    },

    /// Two patterns capture the same position under different names.
    #[error("parameter {{{found}}} in {pattern} conflicts with existing {{{existing}}}")]
    ParamConflict {
        /// Pattern being inserted.
        pattern: String,
        /// Name already registered at this position.
        existing: String,
        /// Name used by the new pattern.
        found: String,
    },

    /// The pattern is syntactically unusable.
    #[error("invalid route pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
