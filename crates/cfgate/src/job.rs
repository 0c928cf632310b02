//! Job status endpoint.
//!
//! `GET /v3/jobs/{guid}` recomputes the state of a job from its target
//! resource on every poll; nothing about the job is stored. How the state is
//! derived depends on the operation:
//!
//! | Operation | Source | State |
//! |---|---|---|
//! | `space.apply_manifest` | none | always `COMPLETE` |
//! | with a [`DeletionRepository`] | deletion timestamp | `COMPLETE` once gone, `PROCESSING` until the deletion timeout, then `FAILED` |
//! | with a [`StateRepository`] | resource state | `COMPLETE` when ready, `PROCESSING` otherwise |
//!
//! Any other recognised operation is reported as a missing job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cfgate_core::job::{job_url, JOB_RESOURCE_TYPE};
use cfgate_core::{
    ApiError, ApiResponse, AuthInfo, BoxFuture, ErrorEntry, Handler, HandlerResult, JobId,
    JobOperation, RequestContext,
};
use cfgate_server::{Route, RouteSet};
use serde::Serialize;

/// Route pattern of the job endpoint.
pub const JOB_PATH: &str = "/v3/jobs/{guid}";

/// How long a deletion may take before its job is reported as failed.
pub const DEFAULT_DELETION_TIMEOUT: Duration = Duration::from_secs(120);

/// Reports when a resource was marked for deletion.
pub trait DeletionRepository: Send + Sync + 'static {
    /// The deletion timestamp of `guid`, or `None` if it is not being
    /// deleted.
    ///
    /// A resource that no longer exists answers `NotFound` (or `Forbidden`).
    fn deleted_at<'a>(
        &'a self,
        info: &'a AuthInfo,
        guid: &'a str,
    ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ApiError>>;
}

/// Readiness of a resource created or updated asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// The operation has taken effect.
    Ready,
    /// Still reconciling.
    NotReady,
}

/// Reports the readiness of a resource.
pub trait StateRepository: Send + Sync + 'static {
    /// The current state of `guid`.
    fn state<'a>(
        &'a self,
        info: &'a AuthInfo,
        guid: &'a str,
    ) -> BoxFuture<'a, Result<ResourceState, ApiError>>;
}

/// Job state as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Finished successfully.
    Complete,
    /// Still running.
    Processing,
    /// Gave up; see the job errors.
    Failed,
}

/// A link object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Absolute URL.
    pub href: String,
}

/// Links of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobLinks {
    /// The job itself.
    #[serde(rename = "self")]
    pub self_link: Link,
    /// The space a manifest was applied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<Link>,
}

/// Body of `GET /v3/jobs/{guid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResponse {
    /// The job identifier.
    pub guid: String,
    /// Operation name, e.g. `app.delete`.
    pub operation: String,
    /// Current state.
    pub state: JobState,
    /// Errors for a failed job.
    pub errors: Vec<ErrorEntry>,
    /// Always empty.
    pub warnings: Vec<String>,
    /// Jobs are not persisted, so this is always empty.
    pub created_at: String,
    /// Jobs are not persisted, so this is always empty.
    pub updated_at: String,
    /// Related URLs.
    pub links: JobLinks,
}

impl JobResponse {
    fn new(id: &JobId, state: JobState, server_url: &str) -> Self {
        let space = (id.operation() == JobOperation::SpaceApplyManifest).then(|| Link {
            href: format!("{server_url}/v3/spaces/{}", id.resource_guid()),
        });
        Self {
            guid: id.encode(),
            operation: id.operation().as_str().to_string(),
            state,
            errors: Vec::new(),
            warnings: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
            links: JobLinks {
                self_link: Link {
                    href: job_url(server_url, id),
                },
                space,
            },
        }
    }

    fn with_error(mut self, error: ErrorEntry) -> Self {
        self.errors.push(error);
        self
    }
}

fn deletion_timed_out(id: &JobId) -> ErrorEntry {
    let err = ApiError::unprocessable(format!(
        "{} deletion timed out, check the remaining \"{}\" resource",
        id.operation().resource_type(),
        id.resource_guid()
    ));
    ErrorEntry {
        title: err.title().to_string(),
        detail: err.detail(),
        code: err.code(),
    }
}

/// Serves [`JOB_PATH`].
#[derive(Clone)]
pub struct JobHandler {
    server_url: String,
    deletion_timeout: Duration,
    deletion_repositories: HashMap<JobOperation, Arc<dyn DeletionRepository>>,
    state_repositories: HashMap<JobOperation, Arc<dyn StateRepository>>,
}

impl std::fmt::Debug for JobHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandler")
            .field("server_url", &self.server_url)
            .field("deletion_timeout", &self.deletion_timeout)
            .field("deletion_operations", &self.deletion_repositories.keys().collect::<Vec<_>>())
            .field("state_operations", &self.state_repositories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl JobHandler {
    /// Creates a handler with no repositories.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            deletion_timeout: DEFAULT_DELETION_TIMEOUT,
            deletion_repositories: HashMap::new(),
            state_repositories: HashMap::new(),
        }
    }

    /// Sets how long a deletion may take.
    #[must_use]
    pub fn with_deletion_timeout(mut self, timeout: Duration) -> Self {
        self.deletion_timeout = timeout;
        self
    }

    /// Reports `operation` from deletion timestamps.
    #[must_use]
    pub fn with_deletion_repository(
        mut self,
        operation: JobOperation,
        repository: Arc<dyn DeletionRepository>,
    ) -> Self {
        self.deletion_repositories.insert(operation, repository);
        self
    }

    /// Reports `operation` from resource readiness.
    #[must_use]
    pub fn with_state_repository(
        mut self,
        operation: JobOperation,
        repository: Arc<dyn StateRepository>,
    ) -> Self {
        self.state_repositories.insert(operation, repository);
        self
    }

    /// Computes the status of job `guid`.
    ///
    /// # Errors
    ///
    /// `NotFound` for `Job` if the identifier is malformed, the operation has
    /// no registered repository, or the resource is not being deleted.
    /// Repository failures other than not-found or forbidden are passed on.
    pub async fn status(&self, info: &AuthInfo, guid: &str) -> Result<JobResponse, ApiError> {
        let id = JobId::decode(guid).map_err(|err| {
            tracing::debug!(guid, "invalid job guid");
            err
        })?;
        let operation = id.operation();

        if operation == JobOperation::SpaceApplyManifest {
            return Ok(JobResponse::new(&id, JobState::Complete, &self.server_url));
        }

        if let Some(repository) = self.deletion_repositories.get(&operation) {
            return self.deletion_status(repository.as_ref(), info, &id).await;
        }

        if let Some(repository) = self.state_repositories.get(&operation) {
            return self.readiness_status(repository.as_ref(), info, &id).await;
        }

        tracing::debug!(%operation, "no repository for job operation");
        Err(ApiError::not_found(JOB_RESOURCE_TYPE))
    }

    async fn deletion_status(
        &self,
        repository: &dyn DeletionRepository,
        info: &AuthInfo,
        id: &JobId,
    ) -> Result<JobResponse, ApiError> {
        let deleted_at = match repository.deleted_at(info, id.resource_guid()).await {
            Ok(deleted_at) => deleted_at,
            Err(ApiError::NotFound { .. } | ApiError::Forbidden { .. }) => {
                return Ok(JobResponse::new(id, JobState::Complete, &self.server_url));
            }
            Err(err) => {
                tracing::warn!(
                    resource_type = id.operation().resource_type(),
                    guid = id.resource_guid(),
                    error = %err,
                    "failed to fetch resource for deletion job"
                );
                return Err(err);
            }
        };

        let Some(deleted_at) = deleted_at else {
            tracing::debug!(
                resource_type = id.operation().resource_type(),
                guid = id.resource_guid(),
                "resource not marked for deletion"
            );
            return Err(ApiError::not_found(JOB_RESOURCE_TYPE));
        };

        let elapsed = (Utc::now() - deleted_at).to_std().unwrap_or_default();
        if elapsed < self.deletion_timeout {
            Ok(JobResponse::new(id, JobState::Processing, &self.server_url))
        } else {
            Ok(JobResponse::new(id, JobState::Failed, &self.server_url).with_error(deletion_timed_out(id)))
        }
    }

    async fn readiness_status(
        &self,
        repository: &dyn StateRepository,
        info: &AuthInfo,
        id: &JobId,
    ) -> Result<JobResponse, ApiError> {
        let state = match repository.state(info, id.resource_guid()).await {
            Ok(ResourceState::Ready) | Err(ApiError::Forbidden { .. }) => JobState::Complete,
            Ok(ResourceState::NotReady) => JobState::Processing,
            Err(err) => {
                tracing::warn!(
                    resource_type = id.operation().resource_type(),
                    guid = id.resource_guid(),
                    error = %err,
                    "failed to get resource state for job"
                );
                return Err(err);
            }
        };
        Ok(JobResponse::new(id, state, &self.server_url))
    }
}

impl Handler for JobHandler {
    async fn handle(&self, ctx: RequestContext) -> HandlerResult {
        let info = ctx.require_auth_info()?;
        let guid = ctx
            .param("guid")
            .ok_or_else(|| ApiError::not_found(JOB_RESOURCE_TYPE))?;
        let body = self.status(info, guid).await?;
        Ok(ApiResponse::ok(body))
    }
}

impl RouteSet for JobHandler {
    fn authenticated_routes(&self) -> Vec<Route> {
        vec![Route::get(JOB_PATH, self.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const SERVER_URL: &str = "https://api.example.org";

    struct FixedDeletion(Mutex<Option<Result<Option<DateTime<Utc>>, ApiError>>>);

    impl FixedDeletion {
        fn returning(result: Result<Option<DateTime<Utc>>, ApiError>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Some(result))))
        }
    }

    impl DeletionRepository for FixedDeletion {
        fn deleted_at<'a>(
            &'a self,
            _info: &'a AuthInfo,
            _guid: &'a str,
        ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ApiError>> {
            let result = self.0.lock().unwrap().take().expect("called once");
            Box::pin(async move { result })
        }
    }

    struct FixedState(Mutex<Option<Result<ResourceState, ApiError>>>);

    impl StateRepository for FixedState {
        fn state<'a>(
            &'a self,
            _info: &'a AuthInfo,
            _guid: &'a str,
        ) -> BoxFuture<'a, Result<ResourceState, ApiError>> {
            let result = self.0.lock().unwrap().take().expect("called once");
            Box::pin(async move { result })
        }
    }

    fn info() -> AuthInfo {
        AuthInfo::Token("token".to_string())
    }

    fn deletion_job(result: Result<Option<DateTime<Utc>>, ApiError>) -> JobHandler {
        JobHandler::new(SERVER_URL)
            .with_deletion_repository(JobOperation::AppDelete, FixedDeletion::returning(result))
    }

    fn state_job(result: Result<ResourceState, ApiError>) -> JobHandler {
        JobHandler::new(SERVER_URL).with_state_repository(
            JobOperation::ServiceBrokerCreate,
            Arc::new(FixedState(Mutex::new(Some(result)))),
        )
    }

    #[tokio::test]
    async fn test_apply_manifest_is_complete() {
        let job = JobHandler::new(format!("{SERVER_URL}/"))
            .status(&info(), "space.apply_manifest~cf-space-guid")
            .await
            .unwrap();

        assert_eq!(job.state, JobState::Complete);
        assert_eq!(job.links.self_link.href, format!("{SERVER_URL}/v3/jobs/space.apply_manifest~cf-space-guid"));
        assert_eq!(
            job.links.space.unwrap().href,
            format!("{SERVER_URL}/v3/spaces/cf-space-guid")
        );
    }

    #[tokio::test]
    async fn test_recent_deletion_is_processing() {
        let deleted_at = Utc::now() - chrono::Duration::seconds(10);
        let job = deletion_job(Ok(Some(deleted_at)))
            .status(&info(), "app.delete~my-app")
            .await
            .unwrap();

        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.operation, "app.delete");
        assert!(job.errors.is_empty());
        assert!(job.links.space.is_none());
    }

    #[tokio::test]
    async fn test_gone_resource_is_complete() {
        for err in [ApiError::not_found("App"), ApiError::forbidden("App")] {
            let job = deletion_job(Err(err))
                .status(&info(), "app.delete~my-app")
                .await
                .unwrap();
            assert_eq!(job.state, JobState::Complete);
        }
    }

    #[tokio::test]
    async fn test_stale_deletion_fails() {
        let deleted_at = Utc::now() - chrono::Duration::seconds(121);
        let job = deletion_job(Ok(Some(deleted_at)))
            .status(&info(), "app.delete~my-app")
            .await
            .unwrap();

        assert_eq!(job.state, JobState::Failed);
        assert_eq!(
            job.errors,
            vec![ErrorEntry {
                title: "CF-UnprocessableEntity".to_string(),
                detail: "App deletion timed out, check the remaining \"my-app\" resource".to_string(),
                code: 10008,
            }]
        );
    }

    #[tokio::test]
    async fn test_deletion_timeout_is_configurable() {
        let deleted_at = Utc::now() - chrono::Duration::seconds(30);
        let job = deletion_job(Ok(Some(deleted_at)))
            .with_deletion_timeout(Duration::from_secs(20))
            .status(&info(), "app.delete~my-app")
            .await
            .unwrap();
        assert_eq!(job.state, JobState::Failed);
    }

    #[tokio::test]
    async fn test_not_marked_for_deletion_is_not_found() {
        let err = deletion_job(Ok(None))
            .status(&info(), "app.delete~my-app")
            .await
            .unwrap_err();
        assert_eq!(err.title(), "CF-ResourceNotFound");
        assert_eq!(
            err.detail(),
            "Job not found. Ensure it exists and you have access to it."
        );
    }

    #[tokio::test]
    async fn test_deletion_lookup_failure_propagates() {
        let err = deletion_job(Err(ApiError::unknown(std::io::Error::other("etcd down"))))
            .status(&info(), "app.delete~my-app")
            .await
            .unwrap_err();
        assert!(err.is_unknown());
    }

    #[tokio::test]
    async fn test_state_jobs() {
        let cases = [
            (Ok(ResourceState::Ready), JobState::Complete),
            (Ok(ResourceState::NotReady), JobState::Processing),
            (Err(ApiError::forbidden("ServiceBroker")), JobState::Complete),
        ];
        for (result, expected) in cases {
            let job = state_job(result)
                .status(&info(), "service_broker.create~broker-guid")
                .await
                .unwrap();
            assert_eq!(job.state, expected);
        }
    }

    #[tokio::test]
    async fn test_state_lookup_failure_propagates() {
        let err = state_job(Err(ApiError::unknown(std::io::Error::other("boom"))))
            .status(&info(), "service_broker.create~broker-guid")
            .await
            .unwrap_err();
        assert!(err.is_unknown());
    }

    #[tokio::test]
    async fn test_unregistered_and_malformed_jobs_not_found() {
        let handler = JobHandler::new(SERVER_URL);
        for guid in ["org.delete~org-guid", "job.operation;some-guid", "nope", "app.delete~"] {
            let err = handler.status(&info(), guid).await.unwrap_err();
            assert_eq!(err.title(), "CF-ResourceNotFound", "{guid}");
        }
    }

    #[tokio::test]
    async fn test_handler_without_guid_param_not_found() {
        let ctx = RequestContext::new(http::Method::GET, "/v3/jobs".parse().unwrap())
            .with_auth_info(Some(info()));
        let err = JobHandler::new(SERVER_URL).handle(ctx).await.unwrap_err();
        assert_eq!(err.title(), "CF-ResourceNotFound");
        assert_eq!(
            err.detail(),
            "Job not found. Ensure it exists and you have access to it."
        );
    }

    #[test]
    fn test_body_shape() {
        let id = JobId::new(JobOperation::AppDelete, "a1");
        let body = serde_json::to_value(JobResponse::new(&id, JobState::Processing, SERVER_URL)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "guid": "app.delete~a1",
                "operation": "app.delete",
                "state": "PROCESSING",
                "errors": [],
                "warnings": [],
                "created_at": "",
                "updated_at": "",
                "links": {"self": {"href": "https://api.example.org/v3/jobs/app.delete~a1"}}
            })
        );
    }
}
