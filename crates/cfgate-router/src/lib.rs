//! Radix tree router for cfgate.
//!
//! Routes are registered as `(method, pattern)` pairs and resolved in time
//! proportional to the number of path segments. The router is generic over
//! the routed value, so the dispatcher can store whole handler records in it.
//!
//! # Matching priority
//!
//! At each segment the router tries, in order:
//!
//! 1. a static child with the same text
//! 2. a `{param}` child, capturing the segment
//! 3. a `*wildcard` child, capturing the rest of the path
//!
//! and backtracks when a branch dead-ends.
//!
//! ```text
//!                 (root)
//!                   │
//!                  "v3"
//!            ┌──────┴──────┐
//!          "apps"        "jobs"
//!        [GET,POST]        │
//!            │          "{guid}"
//!         "{guid}"        [GET]
//!      [GET,PATCH,DELETE]
//! ```
//!
//! # Example
//!
//! ```rust
//! use cfgate_router::{Match, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/v3/jobs/{guid}", "job").unwrap();
//!
//! assert!(matches!(router.at(&Method::GET, "/v3/jobs/x"), Match::Found { .. }));
//! assert!(matches!(
//!     router.at(&Method::POST, "/v3/jobs/x"),
//!     Match::MethodNotAllowed { .. }
//! ));
//! assert!(matches!(router.at(&Method::GET, "/v3/nope"), Match::NotFound));
//! ```

#![doc(html_root_url = "https://docs.rs/cfgate-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use params::Params;
pub use router::{Match, Router};
