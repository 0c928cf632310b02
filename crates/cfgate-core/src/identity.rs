//! Caller credentials, identities and the collaborator traits that resolve
//! them.
//!
//! [`AuthInfo`] is what the client sent. [`Identity`] is who that turned out
//! to be. Resolution and role-binding lookups are delegated to
//! [`IdentityProvider`] and [`RoleBindingLister`], which live outside this
//! workspace (typically backed by the Kubernetes API).

use std::future::Future;
use std::pin::Pin;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Boxed, sendable future used at dyn-compatible trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const BEARER_SCHEME: &str = "bearer";
const CLIENT_CERT_SCHEME: &str = "clientcert";

/// Credential material parsed from the `Authorization` header.
///
/// Lives for one request. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthInfo {
    /// `Authorization: Bearer <token>`.
    Token(String),
    /// `Authorization: ClientCert <base64 PEM>`, already base64-decoded.
    ClientCert(Vec<u8>),
}

impl AuthInfo {
    /// Parses an `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] when the header is missing or blank
    /// - [`ApiError::InvalidAuthToken`] for an unknown scheme, an empty
    ///   credential or undecodable certificate data
    ///
    /// # Example
    ///
    /// ```
    /// use cfgate_core::AuthInfo;
    ///
    /// let info = AuthInfo::parse(Some("Bearer abc")).unwrap();
    /// assert_eq!(info, AuthInfo::Token("abc".to_string()));
    /// assert!(AuthInfo::parse(None).is_err());
    /// ```
    pub fn parse(header: Option<&str>) -> Result<Self, ApiError> {
        let value = header.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(ApiError::not_authenticated());
        }

        let (scheme, credential) = value
            .split_once(char::is_whitespace)
            .map(|(s, c)| (s, c.trim()))
            .unwrap_or((value, ""));

        if credential.is_empty() {
            return Err(ApiError::invalid_auth_token());
        }

        match scheme.to_ascii_lowercase().as_str() {
            BEARER_SCHEME => Ok(Self::Token(credential.to_string())),
            CLIENT_CERT_SCHEME => STANDARD
                .decode(credential)
                .map(Self::ClientCert)
                .map_err(|err| ApiError::invalid_auth_token().with_cause(err)),
            _ => Err(ApiError::invalid_auth_token()),
        }
    }

    /// Scheme name, for logs.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Token(_) => "Bearer",
            Self::ClientCert(_) => "ClientCert",
        }
    }
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("AuthInfo::Token(<redacted>)"),
            Self::ClientCert(data) => write!(f, "AuthInfo::ClientCert({} bytes)", data.len()),
        }
    }
}

/// Kind of principal an identity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKind {
    /// A human user.
    User,
    /// A Kubernetes service account.
    ServiceAccount,
}

impl IdentityKind {
    /// Kubernetes RBAC subject kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::ServiceAccount => "ServiceAccount",
        }
    }
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Principal kind.
    pub kind: IdentityKind,
    /// Principal name.
    pub name: String,
}

impl Identity {
    /// Creates a user identity.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::User,
            name: name.into(),
        }
    }

    /// Creates a service account identity.
    #[must_use]
    pub fn service_account(name: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::ServiceAccount,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Subject of a role binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// RBAC subject kind, e.g. `User`.
    pub kind: String,
    /// Subject name.
    pub name: String,
}

impl Subject {
    /// Returns `true` if this subject names `identity`.
    #[must_use]
    pub fn matches(&self, identity: &Identity) -> bool {
        self.kind == identity.kind.as_str() && self.name == identity.name
    }
}

/// A role binding, reduced to what the advisory check needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    /// Binding name.
    pub name: String,
    /// Subjects the role is granted to.
    pub subjects: Vec<Subject>,
}

impl RoleBinding {
    /// Returns `true` if any subject names `identity`.
    #[must_use]
    pub fn binds(&self, identity: &Identity) -> bool {
        self.subjects.iter().any(|s| s.matches(identity))
    }
}

/// Resolves credentials to identities.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolves `info` to the caller it authenticates.
    ///
    /// Implementations return [`ApiError::InvalidAuthToken`] for credentials
    /// that are well-formed but rejected.
    fn identity<'a>(&'a self, info: &'a AuthInfo) -> BoxFuture<'a, Result<Identity, ApiError>>;
}

/// Lists role bindings in a namespace.
pub trait RoleBindingLister: Send + Sync + 'static {
    /// Returns all role bindings in `namespace`.
    fn list_role_bindings<'a>(
        &'a self,
        namespace: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RoleBinding>, ApiError>>;
}
