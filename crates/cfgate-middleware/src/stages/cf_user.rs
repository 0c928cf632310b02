//! CF-user advisory check.
//!
//! Warns callers that hold no role binding in the root namespace. The check
//! never blocks: a missing identity skips it, and a failed lookup only adds
//! the warning. Positive results are cached for the configured TTL; negative
//! results are not cached, so a newly granted role shows up on the next
//! request.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response};
use cfgate_core::{Identity, RoleBindingLister};
use http::HeaderValue;

/// Response header carrying client-visible warnings.
pub const CF_WARNINGS_HEADER: &str = "x-cf-warnings";

/// Default lifetime of a positive CF-user result.
pub const DEFAULT_CF_USER_TTL: Duration = Duration::from_secs(120);

/// Attaches `X-Cf-Warnings` for callers without any CF role.
pub struct CfUserMiddleware {
    lister: Arc<dyn RoleBindingLister>,
    root_namespace: String,
    cache: TtlCache<Identity>,
}

impl std::fmt::Debug for CfUserMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfUserMiddleware")
            .field("root_namespace", &self.root_namespace)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl CfUserMiddleware {
    /// Creates the middleware checking `root_namespace`.
    pub fn new(lister: Arc<dyn RoleBindingLister>, root_namespace: impl Into<String>) -> Self {
        Self::with_ttl(lister, root_namespace, DEFAULT_CF_USER_TTL)
    }

    /// Creates the middleware with a custom cache TTL.
    pub fn with_ttl(
        lister: Arc<dyn RoleBindingLister>,
        root_namespace: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            lister,
            root_namespace: root_namespace.into(),
            cache: TtlCache::new(ttl),
        }
    }

    /// Returns `true` if `identity` is known to hold a CF role.
    async fn is_cf_user(&self, identity: &Identity) -> bool {
        if self.cache.contains(identity) {
            return true;
        }

        match self.lister.list_role_bindings(&self.root_namespace).await {
            Ok(bindings) => {
                let bound = bindings.iter().any(|binding| binding.binds(identity));
                if bound {
                    self.cache.insert(identity.clone());
                }
                bound
            }
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    namespace = %self.root_namespace,
                    "failed to list role bindings for CF user check"
                );
                false
            }
        }
    }
}

fn no_roles_warning(identity: &Identity) -> String {
    format!(
        "Warning: The authenticated {} '{}' has no CF roles assigned.",
        identity.kind, identity.name
    )
}

impl Middleware for CfUserMiddleware {
    fn name(&self) -> &'static str {
        Stage::CfUser.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(identity) = ctx.auth_info().and(ctx.identity()).cloned() else {
                return next.run(ctx, request).await;
            };

            let warning = if self.is_cf_user(&identity).await {
                None
            } else {
                cfgate_telemetry::record_cf_user_warning();
                Some(no_roles_warning(&identity))
            };

            let mut response = next.run(ctx, request).await;

            if let Some(warning) = warning {
                match HeaderValue::from_str(&warning) {
                    Ok(value) => {
                        response.headers_mut().append(CF_WARNINGS_HEADER, value);
                    }
                    Err(err) => tracing::warn!(error = %err, "cannot encode CF user warning"),
                }
            }

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cfgate_core::{ApiError, AuthInfo, BoxFuture as CoreFuture, RoleBinding, Subject};
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeLister {
        bindings: Mutex<Option<Vec<RoleBinding>>>,
        calls: AtomicUsize,
        namespaces: Mutex<Vec<String>>,
    }

    impl FakeLister {
        fn returning(bindings: Vec<RoleBinding>) -> Arc<Self> {
            Arc::new(Self {
                bindings: Mutex::new(Some(bindings)),
                ..Self::default()
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                bindings: Mutex::new(None),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoleBindingLister for FakeLister {
        fn list_role_bindings<'a>(
            &'a self,
            namespace: &'a str,
        ) -> CoreFuture<'a, Result<Vec<RoleBinding>, ApiError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.namespaces.lock().unwrap().push(namespace.to_string());
                self.bindings
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| ApiError::unknown(std::io::Error::other("list-err")))
            })
        }
    }

    fn binding_for(identity: &Identity) -> RoleBinding {
        RoleBinding {
            name: "cf-admin".to_string(),
            subjects: vec![Subject {
                kind: identity.kind.as_str().to_string(),
                name: identity.name.clone(),
            }],
        }
    }

    fn authed_ctx(identity: Identity) -> MiddlewareContext {
        let mut ctx = MiddlewareContext::new();
        ctx.set_auth_info(AuthInfo::Token("a-token".to_string()));
        ctx.set_identity(identity);
        ctx
    }

    async fn run(mw: &CfUserMiddleware, mut ctx: MiddlewareContext) -> Response {
        let request = HttpRequest::builder()
            .uri("/v3/apps")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::IM_A_TEAPOT)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        });
        mw.process(&mut ctx, request, next).await
    }

    fn warning(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(CF_WARNINGS_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_cf_user_gets_no_warning() {
        let bob = Identity::user("bob");
        let lister = FakeLister::returning(vec![binding_for(&bob)]);
        let mw = CfUserMiddleware::new(lister.clone(), "cfroot");

        let response = run(&mw, authed_ctx(bob)).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(warning(&response).is_none());
        assert_eq!(*lister.namespaces.lock().unwrap(), vec!["cfroot"]);
    }

    #[tokio::test]
    async fn test_non_cf_user_is_warned() {
        let lister = FakeLister::returning(vec![binding_for(&Identity::user("someone-else"))]);
        let mw = CfUserMiddleware::new(lister, "cf");

        let response = run(&mw, authed_ctx(Identity::user("bob"))).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let warning = warning(&response).unwrap();
        assert!(warning.contains("has no CF roles assigned"));
        assert!(warning.contains("bob"));
    }

    #[tokio::test]
    async fn test_kind_must_match() {
        let lister = FakeLister::returning(vec![binding_for(&Identity::service_account("bob"))]);
        let mw = CfUserMiddleware::new(lister, "cf");

        let response = run(&mw, authed_ctx(Identity::user("bob"))).await;
        assert!(warning(&response).is_some());
    }

    #[tokio::test]
    async fn test_list_failure_warns_and_proceeds() {
        let mw = CfUserMiddleware::new(FakeLister::failing(), "cf");

        let response = run(&mw, authed_ctx(Identity::user("bob"))).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(warning(&response).unwrap().contains("has no CF roles assigned"));
    }

    #[tokio::test]
    async fn test_skipped_without_auth_info() {
        let lister = FakeLister::returning(vec![]);
        let mw = CfUserMiddleware::new(lister.clone(), "cf");

        let response = run(&mw, MiddlewareContext::new()).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(warning(&response).is_none());
        assert_eq!(lister.calls(), 0);
    }

    #[tokio::test]
    async fn test_skipped_without_identity() {
        let lister = FakeLister::returning(vec![]);
        let mw = CfUserMiddleware::new(lister.clone(), "cf");
        let mut ctx = MiddlewareContext::new();
        ctx.set_auth_info(AuthInfo::Token("a-token".to_string()));

        let response = run(&mw, ctx).await;
        assert!(warning(&response).is_none());
        assert_eq!(lister.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_result_cached_for_ttl() {
        let bob = Identity::user("bob");
        let lister = FakeLister::returning(vec![binding_for(&bob)]);
        let mw = CfUserMiddleware::new(lister.clone(), "cf");

        run(&mw, authed_ctx(bob.clone())).await;
        run(&mw, authed_ctx(bob.clone())).await;
        assert_eq!(lister.calls(), 1);

        tokio::time::advance(Duration::from_secs(119)).await;
        run(&mw, authed_ctx(bob.clone())).await;
        assert_eq!(lister.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        run(&mw, authed_ctx(bob.clone())).await;
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn test_negative_result_not_cached() {
        let lister = FakeLister::returning(vec![]);
        let mw = CfUserMiddleware::new(lister.clone(), "cf");

        run(&mw, authed_ctx(Identity::user("bob"))).await;
        run(&mw, authed_ctx(Identity::user("bob"))).await;
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_is_per_identity() {
        let bob = Identity::user("bob");
        let alice = Identity::user("alice");
        let lister = FakeLister::returning(vec![binding_for(&bob), binding_for(&alice)]);
        let mw = CfUserMiddleware::new(lister.clone(), "cf");

        run(&mw, authed_ctx(bob)).await;
        run(&mw, authed_ctx(alice)).await;
        assert_eq!(lister.calls(), 2);
    }
}
