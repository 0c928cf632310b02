//! Request context types.
//!
//! The [`RequestContext`] is what a resource handler sees: the decoded request
//! line, headers, body, path parameters, and the per-request values the
//! middleware chain established.

use std::time::Instant;

use bytes::Bytes;
use cfgate_router::Params;
use http::{HeaderMap, Method, Uri};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::AuthInfo;

/// Header carrying the correlation identifier.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Trace identifier stamped on every request/response pair.
///
/// Inbound values are taken verbatim; generated values are UUID v7 so that
/// they sort by creation time in logs.
///
/// # Example
///
/// ```
/// use cfgate_core::CorrelationId;
///
/// let id = CorrelationId::new();
/// assert_eq!(id.as_str().len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wraps an identifier received from the client.
    #[must_use]
    pub fn from_header(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request state handed to a resource handler.
///
/// Built by the dispatcher once routing has succeeded. Handlers own their
/// context, so the body can be moved out for decoding.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    auth_info: Option<AuthInfo>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request with no body, parameters or credential.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Params::new(),
            auth_info: None,
            started_at: Instant::now(),
        }
    }

    /// Sets the correlation identifier.
    #[must_use]
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = id;
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the caller credential.
    #[must_use]
    pub fn with_auth_info(mut self, info: Option<AuthInfo>) -> Self {
        self.auth_info = info;
        self
    }

    /// Correlation identifier of this request.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of the `Content-Type` header, or `""` when absent or not ASCII.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Moves the body out, leaving an empty one behind.
    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// All captured path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Caller credential, if the route was authenticated.
    #[must_use]
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }

    /// Caller credential, or `NotAuthenticated` when there is none.
    pub fn require_auth_info(&self) -> Result<&AuthInfo, ApiError> {
        self.auth_info.as_ref().ok_or_else(ApiError::not_authenticated)
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
