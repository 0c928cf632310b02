//! Handler trait for resource endpoints.
//!
//! A resource handler receives the [`RequestContext`] and returns either an
//! [`ApiResponse`] or an [`ApiError`]. It never renders errors itself; the
//! dispatcher does that in exactly one place.

use std::future::Future;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::identity::BoxFuture;
use crate::response::ApiResponse;

/// What a handler produces.
pub type HandlerResult = Result<ApiResponse, ApiError>;

/// A type-erased handler, as stored in the dispatcher.
pub type BoxHandler = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A resource endpoint.
///
/// # Example
///
/// ```rust
/// use cfgate_core::{ApiResponse, Handler, HandlerResult, RequestContext};
///
/// struct Info;
///
/// impl Handler for Info {
///     async fn handle(&self, _ctx: RequestContext) -> HandlerResult {
///         Ok(ApiResponse::ok(serde_json::json!({"name": "cfgate"})))
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn handle(&self, ctx: RequestContext) -> impl Future<Output = HandlerResult> + Send;
}

/// Adapter that turns an async closure into a [`Handler`].
///
/// Created by [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    func: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Wraps an async closure as a [`Handler`].
///
/// ```rust
/// use cfgate_core::{handler_fn, ApiResponse};
///
/// let health = handler_fn(|_ctx| async {
///     Ok(ApiResponse::ok(serde_json::json!({"status": "ok"})))
/// });
/// # let _ = health;
/// ```
pub fn handler_fn<F, Fut>(func: F) -> HandlerFn<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { func }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext) -> impl Future<Output = HandlerResult> + Send {
        (self.func)(ctx)
    }
}

/// Erases a handler so it can be stored alongside handlers of other types.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    boxed_shared(Arc::new(handler))
}

/// Erases a handler that is already shared, e.g. one that serves several
/// routes.
pub fn boxed_shared<H: Handler>(handler: Arc<H>) -> BoxHandler {
    Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, HandlerResult> {
        let handler = Arc::clone(&handler);
        Box::pin(async move { handler.handle(ctx).await })
    })
}
