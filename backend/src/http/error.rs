//! HTTP error handling and response types.
//!
//! [`AppError`] is the only place where failures become status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::models::{FieldViolation, UniqueField};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field-level validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            errors: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldViolation>) -> Self {
        self.errors = errors;
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Payload failed field validation
    Validation(Vec<FieldViolation>),
    /// Malformed request (path, body or missing id)
    BadRequest(String),
    /// Email or username already belongs to another customer
    Conflict(Option<UniqueField>),
    /// No customer with the requested key; rendered with an empty body
    CustomerNotFound,
    /// Request body refused before parsing (media type, size)
    Rejected(StatusCode, String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CustomerNotFound => StatusCode::NOT_FOUND,
            AppError::Rejected(status, _) => *status,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn conflict_body(field: Option<UniqueField>) -> ApiError {
    match field {
        Some(UniqueField::Email) => ApiError::new("EMAIL_CONFLICT", "Email already exists"),
        Some(UniqueField::Username) => {
            ApiError::new("USERNAME_CONFLICT", "Username already exists")
        }
        None => ApiError::new("CONFLICT", "Customer already exists"),
    }
}

/// `PAYLOAD_TOO_LARGE` style code from the status reason phrase.
fn status_code_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("REQUEST_REJECTED")
        .to_uppercase()
        .replace([' ', '-'], "_")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::CustomerNotFound => return status.into_response(),
            AppError::Validation(violations) => {
                let message = violations
                    .first()
                    .map(|v| v.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                ApiError::new("VALIDATION_ERROR", message).with_errors(violations)
            }
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Conflict(field) => conflict_body(field),
            AppError::Rejected(status, msg) => ApiError::new(status_code_name(status), msg),
            AppError::Repository(e) => {
                tracing::error!(error = %e, "repository error");
                let details = e.context().to_string();
                ApiError::new("REPOSITORY_ERROR", "Storage failure").with_details(details)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { field, .. } => AppError::Conflict(field),
            RepositoryError::NotFound { .. } => AppError::CustomerNotFound,
            other => AppError::Repository(other),
        }
    }
}
