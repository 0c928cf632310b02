//! Job identifiers.
//!
//! Long-running operations answer `202 Accepted` with a `Location` pointing at
//! `/v3/jobs/<id>`. Nothing is stored: the id itself carries the operation and
//! the target resource, joined by `~`, and the job endpoint recomputes status
//! from the resource on every poll.
//!
//! ```text
//! app.delete~7c1a0c6e-2b7f-4c69-9f0e-3f1d5f3b2a10
//! └────┬───┘ └───────────────┬──────────────────┘
//!  operation           resource guid
//! ```

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ApiError;

/// Separator between operation and resource guid.
pub const JOB_DELIMITER: char = '~';

/// Resource type used in job not-found errors.
pub const JOB_RESOURCE_TYPE: &str = "Job";

const JOB_ID_PATTERN: &str = r"^([a-z_\-]+\.[a-z_]+)~([A-Za-z0-9\-\.]+)$";

fn job_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(JOB_ID_PATTERN).expect("valid regex"))
}

/// The closed set of operations that produce jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOperation {
    /// `app.delete`
    AppDelete,
    /// `org.delete`
    OrgDelete,
    /// `space.delete`
    SpaceDelete,
    /// `route.delete`
    RouteDelete,
    /// `domain.delete`
    DomainDelete,
    /// `role.delete`
    RoleDelete,
    /// `space.apply_manifest`
    SpaceApplyManifest,
    /// `space.delete_unmapped_routes`
    SpaceDeleteUnmappedRoutes,
    /// `service_broker.create`
    ServiceBrokerCreate,
    /// `service_broker.update`
    ServiceBrokerUpdate,
    /// `service_broker.delete`
    ServiceBrokerDelete,
    /// `managed_service_instance.create`
    ManagedServiceInstanceCreate,
    /// `managed_service_instance.delete`
    ManagedServiceInstanceDelete,
    /// `managed_service_binding.create`
    ManagedServiceBindingCreate,
    /// `managed_service_binding.delete`
    ManagedServiceBindingDelete,
}

impl JobOperation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::AppDelete,
        Self::OrgDelete,
        Self::SpaceDelete,
        Self::RouteDelete,
        Self::DomainDelete,
        Self::RoleDelete,
        Self::SpaceApplyManifest,
        Self::SpaceDeleteUnmappedRoutes,
        Self::ServiceBrokerCreate,
        Self::ServiceBrokerUpdate,
        Self::ServiceBrokerDelete,
        Self::ManagedServiceInstanceCreate,
        Self::ManagedServiceInstanceDelete,
        Self::ManagedServiceBindingCreate,
        Self::ManagedServiceBindingDelete,
    ];

    /// Wire name, e.g. `app.delete`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AppDelete => "app.delete",
            Self::OrgDelete => "org.delete",
            Self::SpaceDelete => "space.delete",
            Self::RouteDelete => "route.delete",
            Self::DomainDelete => "domain.delete",
            Self::RoleDelete => "role.delete",
            Self::SpaceApplyManifest => "space.apply_manifest",
            Self::SpaceDeleteUnmappedRoutes => "space.delete_unmapped_routes",
            Self::ServiceBrokerCreate => "service_broker.create",
            Self::ServiceBrokerUpdate => "service_broker.update",
            Self::ServiceBrokerDelete => "service_broker.delete",
            Self::ManagedServiceInstanceCreate => "managed_service_instance.create",
            Self::ManagedServiceInstanceDelete => "managed_service_instance.delete",
            Self::ManagedServiceBindingCreate => "managed_service_binding.create",
            Self::ManagedServiceBindingDelete => "managed_service_binding.delete",
        }
    }

    /// Display name of the resource the operation acts on, e.g. `App`.
    #[must_use]
    pub const fn resource_type(self) -> &'static str {
        match self {
            Self::AppDelete => "App",
            Self::OrgDelete => "Org",
            Self::SpaceDelete | Self::SpaceApplyManifest | Self::SpaceDeleteUnmappedRoutes => {
                "Space"
            }
            Self::RouteDelete => "Route",
            Self::DomainDelete => "Domain",
            Self::RoleDelete => "Role",
            Self::ServiceBrokerCreate | Self::ServiceBrokerUpdate | Self::ServiceBrokerDelete => {
                "ServiceBroker"
            }
            Self::ManagedServiceInstanceCreate | Self::ManagedServiceInstanceDelete => {
                "ServiceInstance"
            }
            Self::ManagedServiceBindingCreate | Self::ManagedServiceBindingDelete => {
                "ServiceBinding"
            }
        }
    }

    /// Returns `true` for the `*.delete` operations.
    #[must_use]
    pub fn is_delete(self) -> bool {
        self.as_str().ends_with(".delete")
    }
}

impl std::fmt::Display for JobOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobOperation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ApiError::not_found(JOB_RESOURCE_TYPE))
    }
}

/// A decoded job identifier.
///
/// # Example
///
/// ```
/// use cfgate_core::{JobId, JobOperation};
///
/// let id = JobId::new(JobOperation::AppDelete, "a1b2");
/// assert_eq!(id.to_string(), "app.delete~a1b2");
///
/// let parsed: JobId = "app.delete~a1b2".parse().unwrap();
/// assert_eq!(parsed, id);
///
/// assert!("app.delete;a1b2".parse::<JobId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId {
    operation: JobOperation,
    resource_guid: String,
}

impl JobId {
    /// Creates an identifier for `operation` on `resource_guid`.
    #[must_use]
    pub fn new(operation: JobOperation, resource_guid: impl Into<String>) -> Self {
        Self {
            operation,
            resource_guid: resource_guid.into(),
        }
    }

    /// Parses an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for `Job` if the input does not match
    /// the identifier grammar or names an unknown operation.
    pub fn decode(id: &str) -> Result<Self, ApiError> {
        let caps = job_id_regex()
            .captures(id)
            .ok_or_else(|| ApiError::not_found(JOB_RESOURCE_TYPE))?;

        let operation = caps[1].parse::<JobOperation>()?;
        Ok(Self::new(operation, &caps[2]))
    }

    /// Renders the identifier.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{JOB_DELIMITER}{}", self.operation, self.resource_guid)
    }

    /// The operation.
    #[must_use]
    pub const fn operation(&self) -> JobOperation {
        self.operation
    }

    /// The target resource guid.
    #[must_use]
    pub fn resource_guid(&self) -> &str {
        &self.resource_guid
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{JOB_DELIMITER}{}", self.operation, self.resource_guid)
    }
}

impl FromStr for JobId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Builds the `Location` URL for a job.
#[must_use]
pub fn job_url(server_url: &str, id: &JobId) -> String {
    format!("{}/v3/jobs/{id}", server_url.trim_end_matches('/'))
}
