use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Storage,
}

/// Rejection reason for a candidate user. One variant per check, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,
    #[error("age is required and must be between 1 and 150")]
    AgeInvalid,
    #[error("job title is required")]
    JobTitleRequired,
    #[error("gender is required")]
    GenderRequired,
}

/// Failure reported by the record store. The message is passed through as-is
/// and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The store's message, or `fallback` when the store gave none.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.message.trim().is_empty() {
            fallback
        } else {
            &self.message
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserError {
    pub fn code(&self) -> ErrorCode {
        match self {
            UserError::Validation(_) => ErrorCode::Validation,
            UserError::Storage(_) => ErrorCode::Storage,
        }
    }
}

/// Serializable form of [`UserError`] for machine-readable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&UserError> for ErrorReport {
    fn from(value: &UserError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
