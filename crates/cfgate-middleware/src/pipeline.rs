//! Ordered middleware pipeline.
//!
//! The gateway runs its stages in one fixed order:
//!
//! 1. **Correlation** - adopt or generate `X-Correlation-ID`
//! 2. **Logging** - request span, completion log, metrics
//! 3. **CLI version** - refuse unsupported cf CLI releases
//! 4. **Authentication** - parse credentials, resolve identity
//! 5. **CF user** - warn callers with no CF role
//!
//! [`Stage`] names that order; [`Pipeline`] executes whatever stages it was
//! built with, first added outermost.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable chain of middleware in front of a terminal handler.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .stage(CorrelationMiddleware::new())
///     .stage(LoggingMiddleware::new())
///     .build();
///
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |ctx, req| dispatch(ctx, req))
///     .await;
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage and then `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Names of the stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Earlier stages wrap later ones.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends a shared stage.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The gateway's stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Correlation id propagation.
    Correlation = 1,
    /// Request logging and metrics.
    Logging = 2,
    /// cf CLI version gate.
    CliVersion = 3,
    /// Credential parsing and identity resolution.
    Authentication = 4,
    /// CF-user advisory check.
    CfUser = 5,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Logging => "logging",
            Self::CliVersion => "cli_version",
            Self::Authentication => "authentication",
            Self::CfUser => "cf_user",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::Correlation,
            Self::Logging,
            Self::CliVersion,
            Self::Authentication,
            Self::CfUser,
        ]
    }
}
