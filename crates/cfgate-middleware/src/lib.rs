//! # cfgate middleware
//!
//! The ordered request pipeline every gateway request flows through.
//!
//! ```text
//! Request → Correlation → Logging → CliVersion → Authentication → CfUser → Dispatcher
//!                                                                              ↓
//! Response ←──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Stage | Middleware       | Purpose                                      |
//! |-------|------------------|----------------------------------------------|
//! | 1     | Correlation      | Adopt or generate `X-Correlation-ID`         |
//! | 2     | Logging          | Request span, completion log, metrics        |
//! | 3     | CLI version      | Reject cf CLI releases below the minimum     |
//! | 4     | Authentication   | Parse `Authorization`, resolve the identity  |
//! | 5     | CF user          | Warn callers without any CF role             |
//!
//! Stages that fail a request render the standard error envelope themselves
//! and never reach the dispatcher.
//!
//! ```
//! use cfgate_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "correlation");
//! assert_eq!(stages[4].name(), "cf_user");
//! ```

#![doc(html_root_url = "https://docs.rs/cfgate-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use cache::TtlCache;
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};
pub use types::{Request, Response, ResponseExt, APPLICATION_JSON};
