//! cf CLI version gate.
//!
//! Requests whose `User-Agent` identifies the cf CLI (`cf/<version> ...`)
//! must carry a version satisfying the configured minimum. Anything else
//! passes untouched.

use std::sync::OnceLock;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::Stage;
use crate::types::{Request, Response, ResponseExt};
use cfgate_core::ApiError;
use http::header::USER_AGENT;
use regex::Regex;
use semver::{Version, VersionReq};

/// Minimum version used when the configured one does not parse.
pub const DEFAULT_MIN_CLI_VERSION: &str = "8.5.0";

fn cli_user_agent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^cf/(\S+)").expect("valid regex"))
}

/// Rejects cf CLI releases older than the minimum.
#[derive(Debug, Clone)]
pub struct CliVersionMiddleware {
    min_version: String,
    requirement: VersionReq,
}

impl Default for CliVersionMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLI_VERSION)
    }
}

impl CliVersionMiddleware {
    /// Creates a gate admitting `min_version` and newer.
    ///
    /// An unparsable `min_version` falls back to
    /// [`DEFAULT_MIN_CLI_VERSION`] with a warning.
    #[must_use]
    pub fn new(min_version: &str) -> Self {
        match VersionReq::parse(&format!(">={min_version}")) {
            Ok(requirement) if Version::parse(min_version).is_ok() => Self {
                min_version: min_version.to_string(),
                requirement,
            },
            _ => {
                tracing::warn!(
                    min_version,
                    fallback = DEFAULT_MIN_CLI_VERSION,
                    "invalid cf CLI version constraint, using fallback"
                );
                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        Self {
            min_version: DEFAULT_MIN_CLI_VERSION.to_string(),
            requirement: VersionReq {
                comparators: vec![semver::Comparator {
                    op: semver::Op::GreaterEq,
                    major: 8,
                    minor: Some(5),
                    patch: Some(0),
                    pre: semver::Prerelease::EMPTY,
                }],
            },
        }
    }

    /// The effective minimum version.
    #[must_use]
    pub fn min_version(&self) -> &str {
        &self.min_version
    }

    /// Checks a `User-Agent` value.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] if the agent is the cf CLI and its version
    /// is unparsable or too old.
    pub fn check(&self, user_agent: Option<&str>) -> Result<(), ApiError> {
        let Some(captures) = user_agent.and_then(|ua| cli_user_agent().captures(ua)) else {
            return Ok(());
        };
        let raw = captures.get(1).map_or("", |m| m.as_str());

        let version = Version::parse(raw).map_err(|err| {
            ApiError::invalid_request(format!(
                "Unable to determine the cf CLI version from \"{raw}\". Please upgrade your cf CLI to {} or newer.",
                self.min_version
            ))
            .with_cause(err)
        })?;

        if self.requirement.matches(&version) {
            Ok(())
        } else {
            Err(ApiError::invalid_request(format!(
                "cf CLI version {version} is not supported. Please upgrade your cf CLI to {} or newer.",
                self.min_version
            )))
        }
    }
}

impl Middleware for CliVersionMiddleware {
    fn name(&self) -> &'static str {
        Stage::CliVersion.name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let user_agent = request
                .headers()
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok());

            if let Err(err) = self.check(user_agent) {
                tracing::info!(user_agent, detail = %err.detail(), "rejecting cf CLI request");
                cfgate_telemetry::record_cli_version_rejection();
                return Response::from_api_error(&err);
            }

            next.run(ctx, request).await
        })
    }
}
