//! Request logging and metrics.
//!
//! Opens a `request` span carrying the correlation id, method and path, so
//! every event logged further down the chain is scoped to the request. On
//! completion it logs status, duration and body sizes, and records
//! `cfgate_requests_total` / `cfgate_request_duration_seconds`.
//!
//! Server errors log at `error`, client errors at `warn`, the rest at `info`.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};
use cfgate_telemetry::{record_request, InFlightGuard};
use hyper::body::Body;
use std::time::Instant;
use tracing::Instrument;

/// Structured request/response logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn body_len<B: Body>(body: &B) -> u64 {
    let hint = body.size_hint();
    hint.exact().unwrap_or_else(|| hint.lower())
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        Stage::Logging.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let span = tracing::info_span!(
            "request",
            correlation_id = %ctx.correlation_id(),
            method = %request.method(),
            path = %request.uri().path(),
        );

        Box::pin(
            async move {
                let _in_flight = InFlightGuard::new();
                let start = Instant::now();
                let method = request.method().clone();
                let request_bytes = body_len(request.body());

                let response = next.run(ctx, request).await;

                let duration = start.elapsed();
                let status = response.status();
                let response_bytes = body_len(response.body());
                let duration_ms = duration.as_secs_f64() * 1000.0;

                if status.is_server_error() {
                    tracing::error!(
                        status = status.as_u16(),
                        duration_ms,
                        request_bytes,
                        response_bytes,
                        "request failed"
                    );
                } else if status.is_client_error() {
                    tracing::warn!(
                        status = status.as_u16(),
                        duration_ms,
                        request_bytes,
                        response_bytes,
                        "request rejected"
                    );
                } else {
                    tracing::info!(
                        status = status.as_u16(),
                        duration_ms,
                        request_bytes,
                        response_bytes,
                        "request completed"
                    );
                }

                record_request(method.as_str(), status.as_u16(), duration);
                response
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    #[test]
    fn test_body_len() {
        assert_eq!(body_len(&Full::new(Bytes::from_static(b"hello"))), 5);
        assert_eq!(body_len(&Full::new(Bytes::new())), 0);
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let mw = LoggingMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/v3/apps")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::CREATED)
                    .body(Full::new(Bytes::from_static(b"{\"guid\":\"g\"}")))
                    .unwrap()
            })
        });

        let response = mw.process(&mut ctx, request, next).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
