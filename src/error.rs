//! Domain error types for the document pipeline.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (includes exhausted persistence retries)
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A report with the same source URL already exists
    #[error("Duplicate source URL: {0}")]
    Duplicate(String),

    /// Storage operation failed (download, save, get, or delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis generation failed (includes exhausted analyzer retries)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Processing queue is full or shut down
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}
