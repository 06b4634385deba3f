//! Provider error types.

use std::fmt;
use std::time::Duration;

use cloudsvc_api::ApiError;
use cloudsvc_core::{CoreError, ServiceState};
use cloudsvc_schema::SchemaError;

use crate::config::ConfigError;
use crate::waiter::Operation;

/// Errors surfaced by resource and datasource operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The caller supplied an invalid combination of values.
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    /// Identity or enumeration parsing failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// User-config translation or schema loading failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Service not found: {service}")]
    NotFound { service: String },

    /// The remote reported a terminal failure state during a wait.
    #[error("Service {service} entered {status} state: {detail}")]
    OperationFailed {
        service: String,
        status: ServiceState,
        detail: String,
    },

    /// The wait budget elapsed while the operation was still pending.
    #[error("Timed out after {waited:?} waiting for {operation} of service {service}")]
    OperationTimedOut {
        operation: Operation,
        service: String,
        waited: Duration,
    },

    #[error("{operation} of service {service} was cancelled")]
    Cancelled { operation: Operation, service: String },

    #[error("Remote API error: {0}")]
    Remote(ApiError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ProviderError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(service: impl Into<String>) -> Self {
        Self::NotFound {
            service: service.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the caller supplied invalid input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Returns the error category for logging and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::Core(_) => ErrorCategory::Validation,
            Self::Schema(e) if e.is_validation() => ErrorCategory::Validation,
            Self::Schema(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::OperationFailed { .. } => ErrorCategory::OperationFailed,
            Self::OperationTimedOut { .. } => ErrorCategory::OperationTimedOut,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::Remote(_) => ErrorCategory::Remote,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound {
                project,
                service_name,
            } => Self::NotFound {
                service: cloudsvc_core::encode(&[project, service_name]),
            },
            other => Self::Remote(other),
        }
    }
}

/// Error categories for logging and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    OperationFailed,
    OperationTimedOut,
    Cancelled,
    Remote,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::OperationFailed => write!(f, "operation_failed"),
            Self::OperationTimedOut => write!(f, "operation_timed_out"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Remote => write!(f, "remote"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
