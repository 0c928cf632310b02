//! Liveness endpoint.
//!
//! `GET /healthz` answers `{"status":"ok"}` without credentials. The path
//! has to be on the authentication allow-list as well, see
//! [`HEALTH_PATH`].

use cfgate_core::{handler_fn, ApiResponse};
use serde::Serialize;

use crate::route::{Route, RouteSet};

/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/healthz";

/// Liveness response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    status: &'static str,
}

impl HealthStatus {
    /// The only status this process reports while it can answer at all.
    pub const OK: Self = Self { status: "ok" };

    /// The status string.
    #[must_use]
    pub fn status(&self) -> &str {
        self.status
    }
}

/// Route set serving [`HEALTH_PATH`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Health;

impl RouteSet for Health {
    fn unauthenticated_routes(&self) -> Vec<Route> {
        vec![Route::get(
            HEALTH_PATH,
            handler_fn(|_ctx| async { Ok(ApiResponse::ok(HealthStatus::OK)) }),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_body() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::OK).unwrap(),
            r#"{"status":"ok"}"#
        );
        assert_eq!(HealthStatus::OK.status(), "ok");
    }

    #[test]
    fn test_health_is_unauthenticated() {
        let routes = Health.unauthenticated_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].pattern(), HEALTH_PATH);
        assert!(Health.authenticated_routes().is_empty());
    }
}
