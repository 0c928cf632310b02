//! Response writer.
//!
//! Turns a handler's [`ApiResponse`] into an HTTP response: headers first,
//! then the status, then the JSON body. The body is serialised before the
//! response is committed, so a serialisation failure is logged and replaced
//! by the `Unknown` envelope rather than producing a half-written reply.

use bytes::Bytes;
use cfgate_core::{ApiError, ApiResponse};
use cfgate_middleware::{Response, ResponseExt, APPLICATION_JSON};
use http::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::Full;

/// Writes a successful handler result.
#[must_use]
pub fn write_response(response: ApiResponse) -> Response {
    let (status, headers, body) = response.into_parts();

    let body = match body.map(cfgate_core::JsonBody::into_bytes).transpose() {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, %status, "failed to serialize response body");
            return Response::from_api_error(&ApiError::unknown(err));
        }
    };

    let mut out = http::Response::new(Full::new(Bytes::new()));
    for (name, value) in headers {
        out.headers_mut().append(name, value);
    }
    *out.status_mut() = status;

    if let Some(body) = body {
        out.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        *out.body_mut() = Full::new(Bytes::from(body));
    }

    out
}
