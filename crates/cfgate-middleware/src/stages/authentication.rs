//! Authentication middleware.
//!
//! For every path outside the unauthenticated allow-list:
//!
//! 1. parse `Authorization` into [`AuthInfo`], failing on malformed input
//! 2. store it in the context
//! 3. resolve the caller [`Identity`] once, failing on rejected credentials
//!
//! Only then does the request continue.

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response, ResponseExt};
use cfgate_core::{AuthInfo, IdentityProvider};
use cfgate_router::{Match, RouteError, Router};
use http::header::AUTHORIZATION;
use http::Method;

/// Paths served without credentials.
pub const UNAUTHENTICATED_PATHS: &[&str] = &["/", "/v3", "/api/v1/info", "/api/v1/read/{guid}"];

/// Parses credentials and resolves the caller identity.
pub struct AuthenticationMiddleware {
    provider: Arc<dyn IdentityProvider>,
    allow_list: Router<()>,
}

impl std::fmt::Debug for AuthenticationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationMiddleware")
            .field("allow_list", &self.allow_list.len())
            .finish_non_exhaustive()
    }
}

impl AuthenticationMiddleware {
    /// Creates the middleware with the default allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if a default pattern cannot be listed.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Result<Self, RouteError> {
        let empty = Self {
            provider,
            allow_list: Router::new(),
        };
        UNAUTHENTICATED_PATHS
            .iter()
            .try_fold(empty, |mw, pattern| mw.allow(pattern))
    }

    /// Adds a pattern to the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for an invalid or already listed pattern.
    pub fn allow(mut self, pattern: &str) -> Result<Self, RouteError> {
        self.allow_list.insert(Method::GET, pattern, ())?;
        Ok(self)
    }

    /// Lists the pattern of a route that is served without credentials.
    ///
    /// Unlike [`allow`](Self::allow), a pattern that is already listed is
    /// accepted as is.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for an invalid pattern or one whose parameters
    /// conflict with a listed pattern.
    pub fn allow_route(mut self, pattern: &str) -> Result<Self, RouteError> {
        match self.allow_list.insert(Method::GET, pattern, ()) {
            Ok(()) | Err(RouteError::Duplicate { .. }) => Ok(self),
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if `path` is served without credentials.
    ///
    /// The allow-list is path based; the method does not matter. Trailing
    /// slashes are ignored, as they are by the dispatcher.
    #[must_use]
    pub fn is_unauthenticated(&self, path: &str) -> bool {
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        !matches!(self.allow_list.at(&Method::GET, path), Match::NotFound)
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        Stage::Authentication.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if self.is_unauthenticated(request.uri().path()) {
                return next.run(ctx, request).await;
            }

            let header = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok());

            let info = match AuthInfo::parse(header) {
                Ok(info) => info,
                Err(err) => {
                    tracing::debug!(error = %err, "failed to parse authorization header");
                    return Response::from_api_error(&err);
                }
            };
            ctx.set_auth_info(info.clone());

            match self.provider.identity(&info).await {
                Ok(identity) => {
                    tracing::debug!(identity = %identity, "authenticated");
                    ctx.set_identity(identity);
                }
                Err(err) => {
                    if err.is_unknown() {
                        tracing::error!(error = ?err, "identity resolution failed");
                    } else {
                        tracing::debug!(error = %err, scheme = info.scheme(), "credentials rejected");
                    }
                    return Response::from_api_error(&err);
                }
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cfgate_core::{ApiError, BoxFuture as CoreFuture, Identity};
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct TokenProvider;

    impl IdentityProvider for TokenProvider {
        fn identity<'a>(&'a self, info: &'a AuthInfo) -> CoreFuture<'a, Result<Identity, ApiError>> {
            Box::pin(async move {
                match info {
                    AuthInfo::Token(token) if token == "good" => Ok(Identity::user("alice")),
                    _ => Err(ApiError::invalid_auth_token()),
                }
            })
        }
    }

    fn middleware() -> AuthenticationMiddleware {
        AuthenticationMiddleware::new(Arc::new(TokenProvider)).unwrap()
    }

    fn request(path: &str, auth: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri(path);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
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

    #[test]
    fn test_allow_list() {
        let mw = middleware();
        assert!(mw.is_unauthenticated("/"));
        assert!(mw.is_unauthenticated("/v3"));
        assert!(mw.is_unauthenticated("/v3/"));
        assert!(mw.is_unauthenticated("/api/v1/info"));
        assert!(mw.is_unauthenticated("/api/v1/read/some-guid"));
        assert!(!mw.is_unauthenticated("/v3/apps"));
        assert!(!mw.is_unauthenticated("/api/v1/read"));
    }

    #[test]
    fn test_allow_extends_list() {
        let mw = middleware().allow("/healthz").unwrap();
        assert!(mw.is_unauthenticated("/healthz"));
        assert!(middleware().allow("/v3").is_err());
    }

    #[test]
    fn test_allow_route_tolerates_listed_patterns() {
        let mw = middleware()
            .allow_route("/v3")
            .unwrap()
            .allow_route("/api/v1/status")
            .unwrap();
        assert!(mw.is_unauthenticated("/v3"));
        assert!(mw.is_unauthenticated("/api/v1/status"));

        let err = middleware().allow_route("/api/v1/read/{id}").unwrap_err();
        assert!(matches!(err, RouteError::ParamConflict { .. }));
    }

    #[tokio::test]
    async fn test_allow_listed_path_skips_auth() {
        let mw = middleware();
        let mut ctx = MiddlewareContext::new();
        let response = mw.process(&mut ctx, request("/v3", None), teapot()).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(ctx.auth_info().is_none());
    }

    #[tokio::test]
    async fn test_missing_header_not_authenticated() {
        let mw = middleware();
        let mut ctx = MiddlewareContext::new();
        let response = mw.process(&mut ctx, request("/v3/apps", None), teapot()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let mw = middleware();
        let mut ctx = MiddlewareContext::new();
        let response = mw
            .process(&mut ctx, request("/v3/apps", Some("Basic Zm9v")), teapot())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(ctx.auth_info().is_none());
    }

    #[tokio::test]
    async fn test_rejected_token_fails_after_storing_info() {
        let mw = middleware();
        let mut ctx = MiddlewareContext::new();
        let response = mw
            .process(&mut ctx, request("/v3/apps", Some("Bearer bad")), teapot())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(ctx.auth_info().is_some());
        assert!(ctx.identity().is_none());
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let mw = middleware();
        let mut ctx = MiddlewareContext::new();
        let response = mw
            .process(&mut ctx, request("/v3/apps", Some("Bearer good")), teapot())
            .await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(ctx.identity(), Some(&Identity::user("alice")));
    }
}
