//! # cfgate core
//!
//! Shared types for the cfgate request pipeline:
//!
//! - [`ApiError`] - the client-facing error taxonomy and its JSON envelope
//! - [`RequestContext`] / [`CorrelationId`] - per-request state for handlers
//! - [`AuthInfo`] / [`Identity`] - caller credentials and who they resolve to
//! - [`IdentityProvider`] / [`RoleBindingLister`] - external collaborators
//! - [`Handler`] / [`ApiResponse`] - resource endpoints and their output
//! - [`JobId`] - stateless job identifiers for long-running operations

#![doc(html_root_url = "https://docs.rs/cfgate-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod identity;
pub mod job;
mod response;

pub use context::{CorrelationId, RequestContext, CORRELATION_ID_HEADER};
pub use error::{ApiError, ApiResult, ErrorEntry, ErrorEnvelope};
pub use handler::{boxed, boxed_shared, handler_fn, BoxHandler, Handler, HandlerFn, HandlerResult};
pub use identity::{
    AuthInfo, BoxFuture, Identity, IdentityKind, IdentityProvider, RoleBinding, RoleBindingLister,
    Subject,
};
pub use job::{JobId, JobOperation};
pub use response::{ApiResponse, JsonBody};
