//! API error handling
//!
//! Every failure carries its classification from the point where it is
//! detected; anything unclassified ends up as `Unexpected` (500).
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use postboard_core::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// A single rejected request field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FieldViolation {
    /// Field name as sent by the client
    #[schema(example = "email")]
    pub field: String,
    /// Why the value was rejected
    #[schema(example = "Please enter a valid email.")]
    pub message: String,
}

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Field-level validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<FieldViolation>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Vec<FieldViolation>) -> Self {
        self.data = Some(data);
        self
    }
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed validation (422)
    #[error("{message}")]
    ValidationFailed {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// Missing or malformed credential (401)
    #[error("{0}")]
    Unauthenticated(String),

    /// Bad login credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Token failed signature or expiry checks (401)
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Mutation attempted by someone other than the owner (403)
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate email at signup (409)
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Validation failure without field details
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Validation failure with the rejected fields
    pub fn invalid_input(errors: &validator::ValidationErrors) -> Self {
        AppError::ValidationFailed {
            message: "Validation failed, entered data is incorrect.".to_string(),
            violations: field_violations(errors),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthenticated(_) | AppError::Unauthorized(_) | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationFailed { .. } => "VALIDATION_FAILED",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }
}

/// Flatten validator output into a stable, field-sorted list
fn field_violations(errors: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldViolation {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();

    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error = match self {
            AppError::ValidationFailed {
                message,
                violations,
            } => {
                let error = ApiError::new(code, message);
                if violations.is_empty() {
                    error
                } else {
                    error.with_data(violations)
                }
            }
            AppError::Unexpected(details) => {
                tracing::error!(details = %details, "Request failed unexpectedly");
                ApiError::new(code, "Internal server error")
            }
            other => ApiError::new(code, other.to_string()),
        };

        (status, Json(error)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => AppError::NotFound(format!("Could not find {msg}.")),
            CoreError::DuplicateEmail(_) => {
                AppError::Conflict("E-Mail address already exists!".to_string())
            }
            CoreError::DatabaseError(msg) => AppError::Unexpected(msg),
        }
    }
}
