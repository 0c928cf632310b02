//! # cfgate
//!
//! **Request lifecycle core for a Cloud Foundry V3 API gateway**
//!
//! cfgate takes care of everything between the socket and a resource
//! handler, so CF CLI clients see Cloud Controller behaviour:
//!
//! - CLI version gate, credential parsing and identity resolution
//! - a cached, advisory CF-user role check surfaced as `X-Cf-Warnings`
//! - correlation ids, request logs and Prometheus metrics
//! - JSON/YAML body decoding with strict content types
//! - one error taxonomy rendered as the CF `{"errors":[...]}` envelope
//! - stateless job identifiers and `GET /v3/jobs/{guid}`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cfgate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_defaults()
//!         .with_optional_file("cfgate.toml")?
//!         .with_env_prefix("CFGATE")
//!         .load()?;
//!
//!     Gateway::builder(config)
//!         .identity_provider(Arc::new(MyProvider))
//!         .role_binding_lister(Arc::new(MyLister))
//!         .route_set(Arc::new(AppsRoutes::new()))
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Correlation → Logging → CliVersion → Authentication → CfUser → Dispatcher → Handler
//! ```
//!
//! Every failure, wherever it happens, becomes an
//! [`ApiError`](cfgate_core::ApiError) and is rendered exactly once.

#![doc(html_root_url = "https://docs.rs/cfgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use cfgate_config as config;
pub use cfgate_core as core;
pub use cfgate_extract as extract;
pub use cfgate_middleware as middleware;
pub use cfgate_router as router;
pub use cfgate_server as server;
pub use cfgate_telemetry as telemetry;

mod gateway;
pub mod job;
pub mod root;

pub use gateway::{Gateway, GatewayBuilder, GatewayError};
pub use job::{DeletionRepository, JobHandler, JobResponse, JobState, ResourceState, StateRepository};
pub use root::Root;

/// Prelude module for convenient imports.
///
/// ```rust
/// use cfgate::prelude::*;
/// ```
pub mod prelude {
    pub use cfgate_config::{ConfigLoader, GatewayConfig};
    pub use cfgate_core::{
        handler_fn, ApiError, ApiResponse, ApiResult, AuthInfo, BoxFuture, Handler, HandlerResult,
        Identity, IdentityProvider, JobId, JobOperation, RequestContext, RoleBinding,
        RoleBindingLister, Subject,
    };
    pub use cfgate_extract::{DecoderValidator, Validate, ValidationErrors};
    pub use cfgate_server::{Route, RouteSet};

    pub use crate::gateway::{Gateway, GatewayError};
    pub use crate::job::{DeletionRepository, ResourceState, StateRepository};
}
