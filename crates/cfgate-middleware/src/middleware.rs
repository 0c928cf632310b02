//! Core middleware trait.
//!
//! A stage receives the mutable [`MiddlewareContext`], the request, and a
//! [`Next`] it calls to continue down the chain. Returning a response
//! without calling `next` short-circuits the pipeline.

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
pub use cfgate_core::BoxFuture;

/// A pipeline stage.
///
/// Stages call `next.run()` at most once and never suppress a downstream
/// response; they may only decorate it.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, used in logs and [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The rest of the chain.
///
/// Consumed by [`run`](Next::run), so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

type TerminalHandler<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(TerminalHandler<'a>),
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage, or the terminal handler.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut response = next.run(ctx, request).await;
                response
                    .headers_mut()
                    .append("x-visited", http::HeaderValue::from_static(self.0));
                response
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/v3/apps")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn teapot() -> Next<'static> {
        Next::handler(|_ctx, _req| {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::IM_A_TEAPOT)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        })
    }

    #[tokio::test]
    async fn test_next_handler() {
        let mut ctx = MiddlewareContext::new();
        let response = teapot().run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_chain_unwinds_inner_first() {
        let outer = Tag("outer");
        let inner = Tag("inner");
        let mut ctx = MiddlewareContext::new();

        let next = Next::new(&outer, Next::new(&inner, teapot()));
        let response = next.run(&mut ctx, request()).await;

        let visited: Vec<_> = response
            .headers()
            .get_all("x-visited")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(visited, vec!["inner", "outer"]);
    }
}
