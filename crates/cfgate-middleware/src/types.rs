//! HTTP types shared by the pipeline.

use bytes::Bytes;
use cfgate_core::ApiError;
use http::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Media type of every JSON body the gateway writes.
pub const APPLICATION_JSON: &str = "application/json";

/// Builds responses in the gateway's wire format.
pub trait ResponseExt {
    /// A response with a JSON body.
    fn json(status: http::StatusCode, body: impl Into<Bytes>) -> Response;

    /// Renders an [`ApiError`] as the `{"errors": [...]}` envelope.
    fn from_api_error(err: &ApiError) -> Response;
}

impl ResponseExt for Response {
    fn json(status: http::StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        response
    }

    fn from_api_error(err: &ApiError) -> Response {
        Self::json(err.status_code(), err.to_envelope().to_bytes())
    }
}
