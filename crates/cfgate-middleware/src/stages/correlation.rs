//! Correlation id middleware.
//!
//! Adopts a non-empty `X-Correlation-ID` from the request or generates a
//! UUID v7, stores it in the context and always echoes it on the response.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};
use cfgate_core::{CorrelationId, CORRELATION_ID_HEADER};
use http::HeaderValue;

/// Stamps every request/response pair with a correlation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationMiddleware;

impl CorrelationMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn extract(request: &Request) -> Option<CorrelationId> {
        request
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(CorrelationId::from_header)
    }
}

impl Middleware for CorrelationMiddleware {
    fn name(&self) -> &'static str {
        Stage::Correlation.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = Self::extract(&request).unwrap_or_default();
            ctx.set_correlation_id(id.clone());

            let mut response = next.run(ctx, request).await;

            match HeaderValue::from_str(id.as_str()) {
                Ok(value) => {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Err(err) => tracing::warn!(error = %err, "correlation id is not a valid header value"),
            }

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    fn handler() -> Next<'static> {
        Next::handler(|ctx, _req| {
            let seen = ctx.correlation_id().to_string();
            Box::pin(async move {
                HttpResponse::builder()
                    .status(StatusCode::OK)
                    .header("x-seen", seen)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        })
    }

    #[tokio::test]
    async fn test_generates_when_absent() {
        let mw = CorrelationMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request = HttpRequest::builder()
            .uri("/v3/apps")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = mw.process(&mut ctx, request, handler()).await;

        let echoed = response.headers()[CORRELATION_ID_HEADER].to_str().unwrap();
        assert_eq!(echoed.len(), 36);
        assert_eq!(echoed, response.headers()["x-seen"]);
    }

    #[tokio::test]
    async fn test_propagates_incoming() {
        let mw = CorrelationMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request = HttpRequest::builder()
            .uri("/v3/apps")
            .header("X-Correlation-ID", "client-chosen")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = mw.process(&mut ctx, request, handler()).await;

        assert_eq!(response.headers()[CORRELATION_ID_HEADER], "client-chosen");
        assert_eq!(response.headers()["x-seen"], "client-chosen");
        assert_eq!(ctx.correlation_id().as_str(), "client-chosen");
    }

    #[tokio::test]
    async fn test_blank_header_replaced() {
        let mw = CorrelationMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request = HttpRequest::builder()
            .uri("/")
            .header("X-Correlation-ID", "  ")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = mw.process(&mut ctx, request, handler()).await;
        assert_ne!(response.headers()[CORRELATION_ID_HEADER], "  ");
    }
}
