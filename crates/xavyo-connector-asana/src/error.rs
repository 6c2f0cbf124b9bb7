//! Error types for the Asana connector.

use thiserror::Error;

/// Result type alias using `AsanaError`.
pub type AsanaResult<T> = Result<T, AsanaError>;

/// Hint attached to a denied workspace grant.
pub const WORKSPACE_GRANT_DENIED_HINT: &str = "user does not have permission to add user to \
    workspace or the user was previously removed from the workspace";

/// Errors that can occur when interacting with Asana.
#[derive(Debug, Error)]
pub enum AsanaError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential validation against the upstream failed.
    #[error("failed to authenticate: {0}")]
    Auth(#[source] Box<AsanaError>),

    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The upstream rejected the token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token lacks rights for the request (403).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The requested object does not exist upstream (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upstream rate limit hit (429).
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Any other non-success upstream status.
    #[error("Asana API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Adding a user to a workspace was denied.
    #[error("{source}: {hint}", hint = WORKSPACE_GRANT_DENIED_HINT)]
    WorkspaceGrantDenied {
        #[source]
        source: Box<AsanaError>,
    },

    /// A record or resource is missing a required field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entitlement id is not a `type:id:role` triple.
    #[error("invalid entitlement id: {0}")]
    InvalidEntitlementId(String),

    /// The requested role cannot be granted through the API.
    #[error("unsupported role for {resource_type} grant: {role}")]
    UnsupportedRole { resource_type: String, role: String },

    /// Continuation token could not be decoded.
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),

    /// Operation invoked against a resource type it does not handle.
    #[error("{operation} not implemented for resource type {resource_type}")]
    NotImplemented {
        operation: &'static str,
        resource_type: String,
    },

    /// The caller cancelled the in-flight request.
    #[error("request cancelled")]
    Cancelled,
}

impl AsanaError {
    /// Returns true for errors a caller may reasonably retry.
    ///
    /// The connector itself never retries; this only classifies.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AsanaError::Http(e) => e.is_timeout() || e.is_connect(),
            AsanaError::RateLimited { .. } => true,
            AsanaError::Api { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Returns true when the upstream denied the request for lack of rights.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AsanaError::PermissionDenied(_))
    }

    pub(crate) fn not_implemented(operation: &'static str, resource_type: &str) -> Self {
        AsanaError::NotImplemented {
            operation,
            resource_type: resource_type.to_string(),
        }
    }
}
