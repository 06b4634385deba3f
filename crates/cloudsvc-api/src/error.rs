//! Remote API error types.

/// Errors returned by a [`crate::ServiceApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The remote has no service under this name.
    #[error("Service not found: {project}/{service_name}")]
    NotFound {
        project: String,
        service_name: String,
    },

    /// The remote answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        /// Diagnostic text reported by the remote.
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(project: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self::NotFound {
            project: project.into(),
            service_name: service_name.into(),
        }
    }

    /// Creates a new `Http` error.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if repeating the request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::NotFound { .. } | Self::Decode(_) => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
