//! # cfgate Server
//!
//! HTTP server for the cfgate gateway.
//!
//! - [`Route`] and [`RouteSet`]: how resource modules declare endpoints
//! - [`Dispatcher`]: route lookup, credential check, content-type gate,
//!   handler timeout and the single place errors are rendered
//! - [`write_response`]: headers, status, then JSON body
//! - [`Server`]: hyper HTTP/1 accept loop with graceful shutdown
//! - [`Health`]: `GET /healthz`
//!
//! ## Example
//!
//! ```rust
//! use cfgate_core::{handler_fn, ApiResponse};
//! use cfgate_server::{Dispatcher, Health, Route, RouteSet};
//!
//! struct Info;
//!
//! impl RouteSet for Info {
//!     fn unauthenticated_routes(&self) -> Vec<Route> {
//!         vec![Route::get(
//!             "/api/v1/info",
//!             handler_fn(|_ctx| async { Ok(ApiResponse::ok(serde_json::json!({}))) }),
//!         )]
//!     }
//! }
//!
//! let dispatcher = Dispatcher::builder()
//!     .route_set(&Health)?
//!     .route_set(&Info)?
//!     .build();
//! assert_eq!(dispatcher.route_count(), 2);
//! # Ok::<(), cfgate_server::ServerError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/cfgate-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;
mod health;
mod route;
mod server;
pub mod shutdown;
mod writer;

pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_REQUEST_TIMEOUT};
pub use error::ServerError;
pub use health::{Health, HealthStatus, HEALTH_PATH};
pub use route::{Route, RouteSet};
pub use server::Server;
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use writer::write_response;
