//! Response types for the invoice engine API.
//!
//! This module defines the error response structures and the mapping from
//! [`EngineError`] to HTTP status codes.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, ErrorKind};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Body of a `202 Accepted` PDF request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfJobAccepted {
    /// The enqueued job.
    pub job_id: Uuid,
    /// The invoice to render.
    pub invoice_id: Uuid,
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a `400 Bad Request` response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

/// Maps an error category to the HTTP status it is answered with.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PartialFailure | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Infrastructure => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = status_for(error.kind());
        let message = error.to_string();
        let error = match error {
            EngineError::ConfigNotFound { path } => {
                ApiError::with_details("CONFIG_ERROR", "Configuration error", path)
            }
            EngineError::ConfigParseError { path, .. } => {
                ApiError::with_details("CONFIG_ERROR", message, path)
            }
            EngineError::Validation { field, .. } => {
                ApiError::with_details("VALIDATION_ERROR", message, field)
            }
            EngineError::AgencyNotFound { .. } => ApiError::new("AGENCY_NOT_FOUND", message),
            EngineError::FacilityNotFound { .. } => ApiError::new("FACILITY_NOT_FOUND", message),
            EngineError::InvoiceNotFound { .. } => ApiError::new("INVOICE_NOT_FOUND", message),
            EngineError::WorkRecordNotFound { .. } => {
                ApiError::new("WORK_RECORD_NOT_FOUND", message)
            }
            EngineError::DuplicateInvoiceReference {
                work_record_ids, ..
            } => ApiError::with_details(
                "DUPLICATE_INVOICE_REFERENCE",
                message,
                work_record_ids.join(", "),
            ),
            EngineError::DuplicateInvoiceNumber { .. } => {
                ApiError::new("DUPLICATE_INVOICE_NUMBER", message)
            }
            EngineError::InvalidTransition { .. } => ApiError::new("INVALID_TRANSITION", message),
            EngineError::InvoiceNotDeletable { .. } => {
                ApiError::new("INVOICE_NOT_DELETABLE", message)
            }
            EngineError::PartialFailure {
                missing_records, ..
            } => ApiError::with_details("PARTIAL_FAILURE", message, missing_records.join(", ")),
            EngineError::StoreUnavailable { .. } => ApiError::new("STORE_UNAVAILABLE", message),
            EngineError::QueueUnavailable { .. } => ApiError::new("QUEUE_UNAVAILABLE", message),
        };
        ApiErrorResponse { status, error }
    }
}
