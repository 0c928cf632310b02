//! Per-request state carried through the pipeline.
//!
//! Stages write what they resolve here (correlation id, credentials, caller
//! identity) and the dispatcher copies it into the handler's
//! [`RequestContext`](cfgate_core::RequestContext).

use cfgate_core::{AuthInfo, CorrelationId, Identity};
use std::time::Instant;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use cfgate_core::Identity;
/// use cfgate_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_identity(Identity::user("alice"));
/// assert_eq!(ctx.identity().map(|i| i.name.as_str()), Some("alice"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    correlation_id: CorrelationId,
    auth_info: Option<AuthInfo>,
    identity: Option<Identity>,
    started_at: Instant,
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareContext {
    /// Creates a context with a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            auth_info: None,
            identity: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Replaces the correlation id.
    ///
    /// Only the correlation stage should call this.
    pub fn set_correlation_id(&mut self, id: CorrelationId) {
        self.correlation_id = id;
    }

    /// Credentials parsed by the authentication stage.
    #[must_use]
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }

    /// Stores parsed credentials.
    pub fn set_auth_info(&mut self, info: AuthInfo) {
        self.auth_info = Some(info);
    }

    /// Identity resolved from the credentials.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Stores the resolved identity.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_anonymous() {
        let ctx = MiddlewareContext::new();
        assert!(ctx.auth_info().is_none());
        assert!(ctx.identity().is_none());
        assert!(!ctx.correlation_id().as_str().is_empty());
    }

    #[test]
    fn test_set_values() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_correlation_id(CorrelationId::from_header("abc"));
        ctx.set_auth_info(AuthInfo::Token("t".to_string()));
        ctx.set_identity(Identity::service_account("system:serviceaccount:cf:bot"));

        assert_eq!(ctx.correlation_id().as_str(), "abc");
        assert_eq!(ctx.auth_info(), Some(&AuthInfo::Token("t".to_string())));
        assert_eq!(
            ctx.identity(),
            Some(&Identity::service_account("system:serviceaccount:cf:bot"))
        );
    }
}
