//! Route declarations.
//!
//! Each resource module exposes its endpoints as a [`RouteSet`]: one list of
//! routes served without credentials, one list requiring them. The
//! dispatcher merges every set at startup.

use cfgate_core::{boxed, BoxHandler, Handler};
use http::Method;

/// A method, a path pattern and the handler serving them.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: String,
    handler: BoxHandler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Creates a route from an already erased handler.
    pub fn new(method: Method, pattern: impl Into<String>, handler: BoxHandler) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler,
        }
    }

    /// `GET pattern`.
    pub fn get(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, pattern, boxed(handler))
    }

    /// `POST pattern`.
    pub fn post(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, pattern, boxed(handler))
    }

    /// `PATCH pattern`.
    pub fn patch(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, pattern, boxed(handler))
    }

    /// `PUT pattern`.
    pub fn put(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, pattern, boxed(handler))
    }

    /// `DELETE pattern`.
    pub fn delete(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, pattern, boxed(handler))
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path pattern, e.g. `/v3/jobs/{guid}`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &BoxHandler {
        &self.handler
    }

    pub(crate) fn into_parts(self) -> (Method, String, BoxHandler) {
        (self.method, self.pattern, self.handler)
    }
}

/// The endpoints of one resource.
///
/// ```rust
/// use cfgate_core::{handler_fn, ApiResponse};
/// use cfgate_server::{Route, RouteSet};
///
/// struct Info;
///
/// impl RouteSet for Info {
///     fn unauthenticated_routes(&self) -> Vec<Route> {
///         vec![Route::get(
///             "/api/v1/info",
///             handler_fn(|_ctx| async { Ok(ApiResponse::ok(serde_json::json!({}))) }),
///         )]
///     }
/// }
///
/// assert_eq!(Info.unauthenticated_routes().len(), 1);
/// assert!(Info.authenticated_routes().is_empty());
/// ```
pub trait RouteSet: Send + Sync {
    /// Routes served without credentials.
    fn unauthenticated_routes(&self) -> Vec<Route> {
        Vec::new()
    }

    /// Routes requiring a parsed credential.
    fn authenticated_routes(&self) -> Vec<Route> {
        Vec::new()
    }
}
