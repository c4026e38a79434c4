//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps pipeline and state machine errors to HTTP status codes with a JSON
//! body of error code, message, and details. Internal error details never
//! reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use docket_pipeline::{FactStoreError, PipelineError};
use docket_state::CaseError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404). Also used for cases owned by someone else.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// One request field failed validation (422). The field is reported in
    /// the error details.
    #[error("validation error: {message}")]
    InvalidField { field: &'static str, message: String },

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller did not identify an owner (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict with the case's current phase or status (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A collaborator or the work queue is unavailable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::InvalidField { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let details = match &self {
            Self::InvalidField { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<docket_core::ValidationError> for AppError {
    fn from(err: docket_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CaseError> for AppError {
    fn from(err: CaseError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::CaseNotFound(id) => Self::NotFound(format!("case {id} not found")),
            PipelineError::BatchNotFound(_) | PipelineError::JobNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            PipelineError::Case(e) => e.into(),
            PipelineError::Facts(FactStoreError::CaseNotFound(id)) => {
                Self::NotFound(format!("case {id} not found"))
            }
            PipelineError::Facts(e @ FactStoreError::Locked { .. }) => Self::Conflict(e.to_string()),
            PipelineError::Facts(e @ FactStoreError::Unavailable(_)) => {
                Self::ServiceUnavailable(e.to_string())
            }
            PipelineError::Retry(e) => Self::Conflict(e.to_string()),
            PipelineError::Job(e) => Self::Conflict(e.to_string()),
            PipelineError::GateDenied { .. } => Self::Conflict(err.to_string()),
            PipelineError::Queue(e) => Self::ServiceUnavailable(e.to_string()),
            PipelineError::Internal(msg) => Self::Internal(msg),
        }
    }
}
