//! Error handling for ThunderCast
//!
//! Every failure is terminal for the invocation that hit it. Nothing here is
//! retried; the next scheduled tick or manual trigger is the retry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::SeriesError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Pipeline errors
    #[error("Weather source unreachable: {0}")]
    NetworkFailure(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Store rejected write: {0}")]
    StoreWriteFailure(String),

    #[error("No observations stored yet")]
    NoObservations,

    #[error("Invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    // Model artifact errors
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model schema mismatch: expected {expected}, found {found}")]
    ModelSchemaMismatch { expected: String, found: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NetworkFailure(_) => "NETWORK_FAILURE",
            AppError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            AppError::InsufficientHistory(_) => "INSUFFICIENT_HISTORY",
            AppError::StoreWriteFailure(_) => "STORE_WRITE_FAILURE",
            AppError::NoObservations => "NO_OBSERVATIONS",
            AppError::InvalidSeries(_) => "INVALID_SERIES",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::ModelSchemaMismatch { .. } => "MODEL_SCHEMA_MISMATCH",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NetworkFailure(_) | AppError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::InsufficientHistory(_) | AppError::InvalidSeries(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NoObservations => StatusCode::NOT_FOUND,
            AppError::StoreWriteFailure(_)
            | AppError::DatabaseError(_)
            | AppError::ModelUnavailable(_)
            | AppError::ModelSchemaMismatch { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_)
            | AppError::Io(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Keep connection strings and SQL out of responses
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalError(_) => "An internal error occurred".to_string(),
            AppError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                field,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
