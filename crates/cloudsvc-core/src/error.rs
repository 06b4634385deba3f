use thiserror::Error;

/// Core error types for cloudsvc identity and enumeration parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Malformed identity {id:?}: {reason}")]
    MalformedIdentity { id: String, reason: String },

    #[error("Unsupported service type: {0}")]
    UnknownServiceType(String),

    #[error("Unsupported integration type: {0}")]
    UnknownIntegrationType(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl CoreError {
    /// Create a new MalformedIdentity error
    pub fn malformed_identity(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentity {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnknownServiceType error
    pub fn unknown_service_type(value: impl Into<String>) -> Self {
        Self::UnknownServiceType(value.into())
    }

    /// Create a new UnknownIntegrationType error
    pub fn unknown_integration_type(value: impl Into<String>) -> Self {
        Self::UnknownIntegrationType(value.into())
    }

    /// Create a new InvalidValue error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Every core error is caused by caller input.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedIdentity { .. } => ErrorCategory::Identity,
            Self::UnknownServiceType(_)
            | Self::UnknownIntegrationType(_)
            | Self::InvalidValue { .. } => ErrorCategory::Validation,
        }
    }
}

/// Error categories for logging and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Identity,
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
