//! Gateway assembly.
//!
//! [`GatewayBuilder`] wires configuration, the external collaborators and
//! resource route sets into a ready [`Server`]: the five middleware stages in
//! their fixed order, then a dispatcher holding health, root discovery, the
//! job endpoint and every registered route set.

use std::sync::Arc;

use cfgate_config::{ConfigError, GatewayConfig};
use cfgate_core::{IdentityProvider, JobOperation, RoleBindingLister};
use cfgate_middleware::stages::{
    AuthenticationMiddleware, CfUserMiddleware, CliVersionMiddleware, CorrelationMiddleware,
    LoggingMiddleware,
};
use cfgate_middleware::{Pipeline, Request, Response};
use cfgate_router::RouteError;
use cfgate_server::{Dispatcher, Health, RouteSet, Server, ServerError, ShutdownSignal};
use cfgate_telemetry::TelemetryError;

use crate::job::{DeletionRepository, JobHandler, StateRepository};
use crate::root::Root;

/// Errors building or running a [`Gateway`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No identity provider was supplied.
    #[error("an identity provider is required")]
    MissingIdentityProvider,

    /// No role binding lister was supplied.
    #[error("a role binding lister is required")]
    MissingRoleBindingLister,

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Routes could not be registered, or serving failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// An extra unauthenticated path was rejected.
    #[error("invalid unauthenticated path: {0}")]
    Route(#[from] RouteError),

    /// Logging or metrics could not be initialised.
    #[error("telemetry initialisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// A fully wired gateway.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    server: Server,
}

impl Gateway {
    /// Starts building a gateway from validated-on-build `config`.
    #[must_use]
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    /// The configuration the gateway was built from.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The underlying server.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Handles one buffered request in memory.
    pub async fn handle(&self, request: Request) -> Response {
        self.server.handle(request).await
    }

    /// Initialises telemetry and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Fails if telemetry cannot be initialised, the address cannot be bound,
    /// or the accept loop fails.
    pub async fn run(self) -> Result<(), GatewayError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Like [`run`](Self::run), stopping when `shutdown` fires.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), GatewayError> {
        cfgate_telemetry::init_telemetry(
            &self.config.logging.to_log_config(),
            &self.config.metrics.to_metrics_config(),
        )?;
        tracing::info!(
            addr = %self.config.server.http_addr,
            server_url = self.config.server_url(),
            "starting gateway"
        );
        self.server.run_with_shutdown(shutdown).await?;
        Ok(())
    }
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    role_binding_lister: Option<Arc<dyn RoleBindingLister>>,
    unauthenticated_paths: Vec<String>,
    route_sets: Vec<Arc<dyn RouteSet>>,
    jobs: JobHandler,
}

impl std::fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("server_url", &self.config.server_url())
            .field("identity_provider", &self.identity_provider.is_some())
            .field("role_binding_lister", &self.role_binding_lister.is_some())
            .field("unauthenticated_paths", &self.unauthenticated_paths)
            .field("route_sets", &self.route_sets.len())
            .field("jobs", &self.jobs)
            .finish()
    }
}

impl GatewayBuilder {
    fn new(config: GatewayConfig) -> Self {
        let jobs = JobHandler::new(config.server_url())
            .with_deletion_timeout(config.jobs.deletion_timeout());
        Self {
            config,
            identity_provider: None,
            role_binding_lister: None,
            unauthenticated_paths: Vec::new(),
            route_sets: Vec::new(),
            jobs,
        }
    }

    /// Resolves credentials to identities.
    #[must_use]
    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    /// Lists role bindings for the CF-user check.
    #[must_use]
    pub fn role_binding_lister(mut self, lister: Arc<dyn RoleBindingLister>) -> Self {
        self.role_binding_lister = Some(lister);
        self
    }

    /// Serves `pattern` without credentials.
    ///
    /// The unauthenticated routes of every route set are listed
    /// automatically; this is for paths answered outside the dispatcher.
    #[must_use]
    pub fn allow_unauthenticated(mut self, pattern: impl Into<String>) -> Self {
        self.unauthenticated_paths.push(pattern.into());
        self
    }

    /// Registers a resource module's routes.
    #[must_use]
    pub fn route_set(mut self, set: Arc<dyn RouteSet>) -> Self {
        self.route_sets.push(set);
        self
    }

    /// Reports jobs for `operation` from deletion timestamps.
    #[must_use]
    pub fn deletion_repository(
        mut self,
        operation: JobOperation,
        repository: Arc<dyn DeletionRepository>,
    ) -> Self {
        self.jobs = self.jobs.with_deletion_repository(operation, repository);
        self
    }

    /// Reports jobs for `operation` from resource readiness.
    #[must_use]
    pub fn state_repository(
        mut self,
        operation: JobOperation,
        repository: Arc<dyn StateRepository>,
    ) -> Self {
        self.jobs = self.jobs.with_state_repository(operation, repository);
        self
    }

    /// Validates the configuration and wires everything together.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, a missing collaborator, a rejected
    /// unauthenticated path or two routes claiming the same method and path.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        self.config.validate()?;
        let provider = self
            .identity_provider
            .ok_or(GatewayError::MissingIdentityProvider)?;
        let lister = self
            .role_binding_lister
            .ok_or(GatewayError::MissingRoleBindingLister)?;

        let builtin: [Arc<dyn RouteSet>; 3] = [
            Arc::new(Health),
            Arc::new(Root::new(self.config.server_url())),
            Arc::new(self.jobs),
        ];
        let route_sets: Vec<&Arc<dyn RouteSet>> =
            builtin.iter().chain(&self.route_sets).collect();

        let mut authentication = AuthenticationMiddleware::new(provider)?;
        for pattern in &self.unauthenticated_paths {
            authentication = authentication.allow(pattern)?;
        }
        for route in route_sets.iter().flat_map(|set| set.unauthenticated_routes()) {
            authentication = authentication.allow_route(route.pattern())?;
        }

        let pipeline = Pipeline::builder()
            .stage(CorrelationMiddleware::new())
            .stage(LoggingMiddleware::new())
            .stage(CliVersionMiddleware::new(&self.config.cli.min_version))
            .stage(authentication)
            .stage(CfUserMiddleware::with_ttl(
                lister,
                self.config.auth.root_namespace.clone(),
                self.config.auth.cf_user_cache_ttl(),
            ))
            .build();

        let dispatcher = Dispatcher::builder()
            .request_timeout(self.config.server.request_timeout())
            .route_sets(route_sets)?
            .build();

        tracing::debug!(
            stages = ?pipeline.stage_names(),
            routes = dispatcher.route_count(),
            "gateway assembled"
        );

        let server = Server::new(self.config.server.clone(), pipeline, dispatcher);
        Ok(Gateway {
            config: self.config,
            server,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgate_core::{ApiError, AuthInfo, BoxFuture, Identity, RoleBinding};

    struct Nobody;

    impl IdentityProvider for Nobody {
        fn identity<'a>(&'a self, _info: &'a AuthInfo) -> BoxFuture<'a, Result<Identity, ApiError>> {
            Box::pin(async { Err(ApiError::invalid_auth_token()) })
        }
    }

    impl RoleBindingLister for Nobody {
        fn list_role_bindings<'a>(
            &'a self,
            _namespace: &'a str,
        ) -> BoxFuture<'a, Result<Vec<RoleBinding>, ApiError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn complete() -> GatewayBuilder {
        Gateway::builder(GatewayConfig::default())
            .identity_provider(Arc::new(Nobody))
            .role_binding_lister(Arc::new(Nobody))
    }

    #[test]
    fn test_build_wires_stages_in_order() {
        let gateway = complete().build().unwrap();
        assert_eq!(
            gateway.server().pipeline().stage_names(),
            ["correlation", "logging", "cli_version", "authentication", "cf_user"]
        );
    }

    #[test]
    fn test_missing_collaborators() {
        let err = Gateway::builder(GatewayConfig::default())
            .role_binding_lister(Arc::new(Nobody))
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingIdentityProvider));

        let err = Gateway::builder(GatewayConfig::default())
            .identity_provider(Arc::new(Nobody))
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingRoleBindingLister));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GatewayConfig::default();
        config.server.server_url = "ftp://nope".to_string();
        let err = Gateway::builder(config)
            .identity_provider(Arc::new(Nobody))
            .role_binding_lister(Arc::new(Nobody))
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
        assert!(err.to_string().contains("server.server_url"));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let err = complete()
            .route_set(Arc::new(Health))
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Server(ServerError::Route(_))));
    }

    #[test]
    fn test_duplicate_unauthenticated_path_rejected() {
        let err = complete()
            .allow_unauthenticated("/v3")
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Route(_)));
    }
}
