use std::collections::BTreeMap;

use thiserror::Error;

/// Application-wide error types for Folio.
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested resource does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),

    /// Request is well-formed but violates a business rule.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, expired, or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// Unique constraint on a user-visible field.
    #[error("{0}")]
    Conflict(String),

    /// One or more request fields failed validation.
    #[error("Invalid input")]
    ValidationError { errors: BTreeMap<String, String> },

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Validation error for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        AppError::ValidationError { errors }
    }

    /// Returns true if the caller is at fault (4xx family).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::BadRequest(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
                | AppError::ValidationError { .. }
                | AppError::SerializationError(_)
        )
    }
}
