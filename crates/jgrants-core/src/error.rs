//! Error types for `jgrants-core`.

use reqwest::StatusCode;
use thiserror::Error;

/// A request parameter failed validation.
///
/// The message is meant to be shown to the caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failures talking to the upstream API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status.
    #[error("HTTP error: {} {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown"))]
    Status { status: StatusCode, body: String },

    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("Request error: {0}")]
    Transport(String),

    /// Upstream answered 2xx but the body was not JSON.
    #[error("Invalid JSON from upstream: {0}")]
    Decode(String),

    /// The upstream URL could not be built.
    #[error("Invalid upstream URL: {0}")]
    Url(String),
}

impl UpstreamError {
    /// HTTP status returned by upstream, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Main error type for jGrants operations.
#[derive(Error, Debug)]
pub enum GrantsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream envelope did not contain a usable record.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl GrantsError {
    /// True when upstream reported the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.status() == Some(StatusCode::NOT_FOUND))
    }
}

/// Result type alias for jGrants operations.
pub type Result<T> = std::result::Result<T, GrantsError>;
