//! The gateway's middleware stages, in pipeline order.
//!
//! 1. [`correlation`] - `X-Correlation-ID` propagation
//! 2. [`logging`] - request span, completion log, metrics
//! 3. [`cli_version`] - cf CLI version gate
//! 4. [`authentication`] - credentials and identity
//! 5. [`cf_user`] - no-roles advisory warning

pub mod authentication;
pub mod cf_user;
pub mod cli_version;
pub mod correlation;
pub mod logging;

pub use authentication::{AuthenticationMiddleware, UNAUTHENTICATED_PATHS};
pub use cf_user::{CfUserMiddleware, CF_WARNINGS_HEADER, DEFAULT_CF_USER_TTL};
pub use cli_version::{CliVersionMiddleware, DEFAULT_MIN_CLI_VERSION};
pub use correlation::CorrelationMiddleware;
pub use logging::LoggingMiddleware;
