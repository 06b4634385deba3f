//! Schema and translation error types.

use cloudsvc_core::CoreError;

/// Errors raised while loading schemas or translating user config.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The caller supplied a value the schema does not allow.
    #[error("Validation error at {path}: {message}")]
    Validation {
        /// Dotted path of the offending field.
        path: String,
        /// Description of the violation.
        message: String,
    },

    /// A schema document could not be interpreted.
    #[error("Invalid schema definition: {0}")]
    Definition(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SchemaError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Definition` error.
    #[must_use]
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }

    /// Returns `true` when the error was caused by caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Core(_))
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
