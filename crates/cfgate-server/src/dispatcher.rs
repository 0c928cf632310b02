//! Request dispatcher.
//!
//! The dispatcher is the terminal step of the middleware pipeline. It
//! resolves the route, checks that authenticated routes carry a credential,
//! gates the request content type, runs the handler under the request
//! timeout and renders the outcome. It is the only place handler errors are
//! rendered.
//!
//! No match and a method mismatch both render `CF-ResourceNotFound`.

use std::sync::Arc;
use std::time::Duration;

use cfgate_core::{ApiError, BoxFuture, BoxHandler, RequestContext};
use cfgate_extract::ContentType;
use cfgate_middleware::{MiddlewareContext, Request, Response, ResponseExt};
use cfgate_router::{Match, Router};
use http::header::CONTENT_TYPE;
use http::{Method, Uri};
use http_body_util::BodyExt;

use crate::error::ServerError;
use crate::route::{Route, RouteSet};
use crate::writer::write_response;

/// Default bound on handler execution.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Resource type named by the "no such route" error.
const ENDPOINT: &str = "Endpoint";

#[derive(Clone)]
struct RouteEntry {
    handler: BoxHandler,
    authenticated: bool,
}

/// Routes requests to handlers and renders the results.
pub struct Dispatcher {
    router: Router<RouteEntry>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Dispatcher {
    /// Starts a dispatcher with no routes.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.len()
    }

    /// Handler timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Dispatches one request.
    ///
    /// Routing happens synchronously against `ctx`; the returned future owns
    /// everything it needs, so it can be the pipeline's terminal handler.
    pub fn dispatch(&self, ctx: &MiddlewareContext, request: Request) -> BoxFuture<'static, Response> {
        let (parts, body) = request.into_parts();
        let method = parts.method;
        let uri = parts.uri;

        let (entry, params) = match self.router.at(&method, normalize_path(uri.path())) {
            Match::Found { value, params, .. } => (value.clone(), params),
            Match::MethodNotAllowed { .. } | Match::NotFound => {
                tracing::debug!(%method, path = uri.path(), "no route");
                return ready(Response::from_api_error(&ApiError::not_found(ENDPOINT)));
            }
        };

        let auth_info = ctx.auth_info().cloned();
        if entry.authenticated && auth_info.is_none() {
            return ready(Response::from_api_error(&ApiError::not_authenticated()));
        }

        let request_ctx = RequestContext::new(method.clone(), uri.clone())
            .with_correlation_id(ctx.correlation_id().clone())
            .with_headers(parts.headers)
            .with_params(params)
            .with_auth_info(auth_info);
        let timeout = self.request_timeout;

        Box::pin(async move {
            let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();
            let request_ctx = request_ctx.with_body(body);

            let result = match check_content_type(&request_ctx) {
                Ok(()) => run_handler(&entry.handler, request_ctx, timeout).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(response) => write_response(response),
                Err(err) => render_error(&method, &uri, &err),
            }
        })
    }
}

fn ready(response: Response) -> BoxFuture<'static, Response> {
    Box::pin(std::future::ready(response))
}

/// Strips trailing slashes, keeping the root.
pub(crate) fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// A request with a body must declare JSON or a YAML alias, or nothing.
fn check_content_type(ctx: &RequestContext) -> Result<(), ApiError> {
    if ctx.body().is_empty() {
        return Ok(());
    }
    let declared = ctx
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or("<non-ascii>"))
        .unwrap_or("");
    ContentType::from_header(declared)
        .map(|_| ())
        .map_err(ApiError::from)
}

async fn run_handler(
    handler: &BoxHandler,
    ctx: RequestContext,
    timeout: Duration,
) -> Result<cfgate_core::ApiResponse, ApiError> {
    match tokio::time::timeout(timeout, (**handler)(ctx)).await {
        Ok(result) => result,
        Err(elapsed) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "handler timed out");
            Err(ApiError::unknown(elapsed))
        }
    }
}

fn render_error(method: &Method, uri: &Uri, err: &ApiError) -> Response {
    if err.is_unknown() {
        tracing::error!(
            %method,
            url = %uri,
            error = ?err.cause(),
            "unexpected error handling request"
        );
    } else {
        tracing::debug!(%method, url = %uri, error = %err, "request failed");
    }
    Response::from_api_error(err)
}

/// Collects route sets into a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    router: Router<RouteEntry>,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("routes", &self.router.len())
            .finish_non_exhaustive()
    }
}

impl DispatcherBuilder {
    /// Sets the handler timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Registers every route of `set`.
    ///
    /// # Errors
    ///
    /// [`ServerError::Route`] if a method and pattern pair is already
    /// registered, by this set or an earlier one, or a pattern is invalid.
    pub fn route_set(mut self, set: &dyn RouteSet) -> Result<Self, ServerError> {
        for route in set.unauthenticated_routes() {
            self.insert(route, false)?;
        }
        for route in set.authenticated_routes() {
            self.insert(route, true)?;
        }
        Ok(self)
    }

    /// Registers several route sets in order.
    ///
    /// # Errors
    ///
    /// See [`route_set`](Self::route_set).
    pub fn route_sets<'a, I>(self, sets: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = &'a Arc<dyn RouteSet>>,
    {
        sets.into_iter()
            .try_fold(self, |builder, set| builder.route_set(set.as_ref()))
    }

    fn insert(&mut self, route: Route, authenticated: bool) -> Result<(), ServerError> {
        let (method, pattern, handler) = route.into_parts();
        tracing::debug!(%method, %pattern, authenticated, "registering route");
        self.router.insert(
            method,
            &pattern,
            RouteEntry {
                handler,
                authenticated,
            },
        )?;
        Ok(())
    }

    /// Finishes the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            router: self.router,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}
