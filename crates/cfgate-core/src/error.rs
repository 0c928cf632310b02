//! Client-facing error taxonomy.
//!
//! Every failure that reaches a client is an [`ApiError`]. Each variant maps
//! to a fixed HTTP status, title and numeric code, and renders into the
//! Cloud Foundry v3 error envelope:
//!
//! ```json
//! {"errors":[{"title":"CF-ResourceNotFound","detail":"App not found. Ensure it exists and you have access to it.","code":10010}]}
//! ```
//!
//! | Variant | Status | Title | Code |
//! |---|---|---|---|
//! | `InvalidAuthToken` | 401 | `CF-InvalidAuthToken` | 1000 |
//! | `MessageParse` | 400 | `CF-MessageParseError` | 1001 |
//! | `Unknown` | 500 | `UnknownError` | 10001 |
//! | `NotAuthenticated` | 401 | `CF-NotAuthenticated` | 10002 |
//! | `Forbidden` | 403 | `CF-NotAuthorized` | 10003 |
//! | `InvalidRequest` | 400 | `CF-InvalidRequest` | 10004 |
//! | `UnknownKey` | 400 | `CF-BadQueryParameter` | 10005 |
//! | `UnprocessableEntity` | 422 | `CF-UnprocessableEntity` | 10008 |
//! | `NotFound` | 404 | `CF-ResourceNotFound` | 10010 |
//! | `Uniqueness` | 422 | `CF-UniquenessError` | 10016 |
//! | `PackageBitsAlreadyUploaded` | 400 | `CF-PackageBitsAlreadyUploaded` | 150004 |
//! | `BlobstoreUnavailable` | 502 | `CF-BlobstoreUnavailable` | 150006 |
//!
//! Causes are kept as `anyhow` sources for server-side logging and are never
//! part of the rendered detail.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by handlers and middleware.
pub type ApiResult<T> = Result<T, ApiError>;

/// A client-facing error.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The resource does not exist or the caller may not know it exists.
    #[error("{resource_type} not found")]
    NotFound {
        /// Display name of the resource type, e.g. `App`.
        resource_type: String,
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The caller is not allowed to perform the action.
    #[error("forbidden access to {resource_type}")]
    Forbidden {
        /// Resource type the caller was denied on.
        resource_type: String,
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The payload is well-formed but semantically invalid.
    #[error("unprocessable entity: {detail}")]
    UnprocessableEntity {
        /// Message shown to the client.
        detail: String,
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The body could not be parsed at all.
    #[error("request body could not be parsed")]
    MessageParse {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The request is invalid for a reason outside the body schema.
    #[error("invalid request: {detail}")]
    InvalidRequest {
        /// Message shown to the client.
        detail: String,
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// A query parameter is not recognised.
    #[error("unknown query parameter, valid keys are {valid_keys:?}")]
    UnknownKey {
        /// The keys the endpoint accepts.
        valid_keys: Vec<String>,
    },

    /// A uniqueness constraint was violated.
    #[error("uniqueness violation: {detail}")]
    Uniqueness {
        /// Message shown to the client.
        detail: String,
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The credential was present but unusable.
    #[error("invalid auth token")]
    InvalidAuthToken {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// No credential was supplied.
    #[error("not authenticated")]
    NotAuthenticated {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// Package bits can only be uploaded once.
    #[error("package bits already uploaded")]
    PackageBitsAlreadyUploaded {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// The image registry backing package uploads is unreachable.
    #[error("blobstore unavailable")]
    BlobstoreUnavailable {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// Anything not covered above. Never reveals the cause.
    #[error("unknown error")]
    Unknown {
        /// Underlying failure.
        #[source]
        cause: Option<anyhow::Error>,
    },
}

const NOT_AUTHORIZED_DETAIL: &str = "You are not authorized to perform the requested action";
const MESSAGE_PARSE_DETAIL: &str = "Request invalid due to parse error: invalid request body";
const UNKNOWN_DETAIL: &str = "An unknown error occurred.";

impl ApiError {
    /// Creates a not-found error for a resource type.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            cause: None,
        }
    }

    /// Creates a forbidden error for a resource type.
    #[must_use]
    pub fn forbidden(resource_type: impl Into<String>) -> Self {
        Self::Forbidden {
            resource_type: resource_type.into(),
            cause: None,
        }
    }

    /// Creates an unprocessable-entity error with a client-visible detail.
    #[must_use]
    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            detail: detail.into(),
            cause: None,
        }
    }

    /// Creates a message-parse error.
    #[must_use]
    pub fn message_parse(cause: impl Into<anyhow::Error>) -> Self {
        Self::MessageParse {
            cause: Some(cause.into()),
        }
    }

    /// Creates an invalid-request error with a client-visible detail.
    #[must_use]
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::InvalidRequest {
            detail: detail.into(),
            cause: None,
        }
    }

    /// Creates an unknown-key error listing the accepted keys.
    #[must_use]
    pub fn unknown_key<I, S>(valid_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnknownKey {
            valid_keys: valid_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a uniqueness error with a client-visible detail.
    #[must_use]
    pub fn uniqueness(detail: impl Into<String>) -> Self {
        Self::Uniqueness {
            detail: detail.into(),
            cause: None,
        }
    }

    /// Creates an invalid-auth-token error.
    #[must_use]
    pub fn invalid_auth_token() -> Self {
        Self::InvalidAuthToken { cause: None }
    }

    /// Creates a not-authenticated error.
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::NotAuthenticated { cause: None }
    }

    /// Creates a package-bits-already-uploaded error.
    #[must_use]
    pub fn package_bits_already_uploaded() -> Self {
        Self::PackageBitsAlreadyUploaded { cause: None }
    }

    /// Creates a blobstore-unavailable error.
    #[must_use]
    pub fn blobstore_unavailable(cause: impl Into<anyhow::Error>) -> Self {
        Self::BlobstoreUnavailable {
            cause: Some(cause.into()),
        }
    }

    /// Coerces any error into the taxonomy.
    ///
    /// An `ApiError` is returned as is; everything else becomes
    /// [`ApiError::Unknown`].
    #[must_use]
    pub fn from_any<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::unknown(err)
    }

    /// Wraps an arbitrary failure as [`ApiError::Unknown`].
    ///
    /// If the failure already is an `ApiError` it is returned unchanged.
    #[must_use]
    pub fn unknown(cause: impl Into<anyhow::Error>) -> Self {
        let cause = cause.into();
        match cause.downcast::<ApiError>() {
            Ok(api) => api,
            Err(other) => Self::Unknown { cause: Some(other) },
        }
    }

    /// Attaches an underlying cause, replacing any previous one.
    ///
    /// `UnknownKey` carries no cause and is returned unchanged.
    #[must_use]
    pub fn with_cause(mut self, err: impl Into<anyhow::Error>) -> Self {
        let new = Some(err.into());
        match &mut self {
            Self::NotFound { cause, .. }
            | Self::Forbidden { cause, .. }
            | Self::UnprocessableEntity { cause, .. }
            | Self::MessageParse { cause }
            | Self::InvalidRequest { cause, .. }
            | Self::Uniqueness { cause, .. }
            | Self::InvalidAuthToken { cause }
            | Self::NotAuthenticated { cause }
            | Self::PackageBitsAlreadyUploaded { cause }
            | Self::BlobstoreUnavailable { cause }
            | Self::Unknown { cause } => *cause = new,
            Self::UnknownKey { .. } => {}
        }
        self
    }

    /// Rewrites `Forbidden` as `NotFound` for `resource_type`.
    ///
    /// Read paths call this so an unauthorised caller cannot tell a hidden
    /// resource from a missing one. Other variants pass through.
    ///
    /// ```rust
    /// use cfgate_core::ApiError;
    ///
    /// let err = ApiError::forbidden("Route").forbidden_as_not_found("Route");
    /// assert_eq!(err.title(), "CF-ResourceNotFound");
    /// assert_eq!(err.status_code().as_u16(), 404);
    /// ```
    #[must_use]
    pub fn forbidden_as_not_found(self, resource_type: &str) -> Self {
        match self {
            Self::Forbidden { cause, .. } => Self::NotFound {
                resource_type: resource_type.to_string(),
                cause,
            },
            other => other,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::UnprocessableEntity { .. } | Self::Uniqueness { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::MessageParse { .. }
            | Self::InvalidRequest { .. }
            | Self::UnknownKey { .. }
            | Self::PackageBitsAlreadyUploaded { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidAuthToken { .. } | Self::NotAuthenticated { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::BlobstoreUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable title, e.g. `CF-ResourceNotFound`.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "CF-ResourceNotFound",
            Self::Forbidden { .. } => "CF-NotAuthorized",
            Self::UnprocessableEntity { .. } => "CF-UnprocessableEntity",
            Self::MessageParse { .. } => "CF-MessageParseError",
            Self::InvalidRequest { .. } => "CF-InvalidRequest",
            Self::UnknownKey { .. } => "CF-BadQueryParameter",
            Self::Uniqueness { .. } => "CF-UniquenessError",
            Self::InvalidAuthToken { .. } => "CF-InvalidAuthToken",
            Self::NotAuthenticated { .. } => "CF-NotAuthenticated",
            Self::PackageBitsAlreadyUploaded { .. } => "CF-PackageBitsAlreadyUploaded",
            Self::BlobstoreUnavailable { .. } => "CF-BlobstoreUnavailable",
            Self::Unknown { .. } => "UnknownError",
        }
    }

    /// Numeric Cloud Controller error code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::InvalidAuthToken { .. } => 1000,
            Self::MessageParse { .. } => 1001,
            Self::Unknown { .. } => 10001,
            Self::NotAuthenticated { .. } => 10002,
            Self::Forbidden { .. } => 10003,
            Self::InvalidRequest { .. } => 10004,
            Self::UnknownKey { .. } => 10005,
            Self::UnprocessableEntity { .. } => 10008,
            Self::NotFound { .. } => 10010,
            Self::Uniqueness { .. } => 10016,
            Self::PackageBitsAlreadyUploaded { .. } => 150_004,
            Self::BlobstoreUnavailable { .. } => 150_006,
        }
    }

    /// Client-visible detail string.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound { resource_type, .. } => {
                format!("{resource_type} not found. Ensure it exists and you have access to it.")
            }
            Self::Forbidden { .. } => NOT_AUTHORIZED_DETAIL.to_string(),
            Self::UnprocessableEntity { detail, .. }
            | Self::InvalidRequest { detail, .. }
            | Self::Uniqueness { detail, .. } => detail.clone(),
            Self::MessageParse { .. } => MESSAGE_PARSE_DETAIL.to_string(),
            Self::UnknownKey { valid_keys } => format!(
                "The query parameter is invalid: Valid parameters are: '{}'",
                valid_keys.join(", ")
            ),
            Self::InvalidAuthToken { .. } => "Invalid Auth Token".to_string(),
            Self::NotAuthenticated { .. } => "Authentication error".to_string(),
            Self::PackageBitsAlreadyUploaded { .. } => {
                "Bits may be uploaded only once. Create a new package to upload different bits."
                    .to_string()
            }
            Self::BlobstoreUnavailable { .. } => {
                "Error uploading source package to the container registry".to_string()
            }
            Self::Unknown { .. } => UNKNOWN_DETAIL.to_string(),
        }
    }

    /// The underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::NotFound { cause, .. }
            | Self::Forbidden { cause, .. }
            | Self::UnprocessableEntity { cause, .. }
            | Self::MessageParse { cause }
            | Self::InvalidRequest { cause, .. }
            | Self::Uniqueness { cause, .. }
            | Self::InvalidAuthToken { cause }
            | Self::NotAuthenticated { cause }
            | Self::PackageBitsAlreadyUploaded { cause }
            | Self::BlobstoreUnavailable { cause }
            | Self::Unknown { cause } => cause.as_ref(),
            Self::UnknownKey { .. } => None,
        }
    }

    /// Returns `true` for [`ApiError::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Builds the single-entry error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            errors: vec![ErrorEntry {
                title: self.title().to_string(),
                detail: self.detail(),
                code: self.code(),
            }],
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::unknown(err)
    }
}

/// The `{"errors": [...]}` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error entries. Current call sites always produce exactly one.
    pub errors: Vec<ErrorEntry>,
}

/// One entry in an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Stable title, e.g. `CF-UnprocessableEntity`.
    pub title: String,
    /// Human-readable detail.
    pub detail: String,
    /// Numeric error code.
    pub code: u32,
}

impl ErrorEnvelope {
    /// Serialises the envelope.
    ///
    /// Falls back to a fixed `UnknownError` body if serialisation fails so a
    /// client never receives an empty error response.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to serialise error envelope");
            br#"{"errors":[{"title":"UnknownError","detail":"An unknown error occurred.","code":10001}]}"#
                .to_vec()
        })
    }
}
