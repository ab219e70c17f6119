//! Error handling for the Goodpack inventory server
//!
//! Errors are rendered as plain text: status code plus message, no JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::{CodeError, StockError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Optimistic concurrency check failed
    #[error("Conflict: {0}")]
    Conflict(String),

    // Data errors
    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEntry(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CorruptedData(_)
            | AppError::StorageError(_)
            | AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client; storage details stay in the log
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalError(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CodeError> for AppError {
    fn from(err: CodeError) -> Self {
        AppError::CorruptedData(err.to_string())
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
            })
            .collect();
        if messages.is_empty() {
            messages.push(errors.to_string());
        }
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Validation(format!("Failed to read CSV: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::CorruptedData(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, self.public_message()).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("Product".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("Product".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(CodeError::InvalidQuotationCode("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AppError::NotFound("Product".into()).to_string(), "Product not found");
        assert_eq!(
            AppError::validation("Customer not found").to_string(),
            "Customer not found"
        );
    }
}
