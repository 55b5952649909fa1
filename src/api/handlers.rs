//! HTTP request handlers for the invoice engine API.
//!
//! Every handler tags its log lines with a fresh correlation id, turns body
//! and path problems into `400` responses and maps [`EngineError`]s through
//! [`ApiErrorResponse`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::invoicing::{CreateInvoiceRequest, PreviewRequest};

use super::request::{PdfRequest, StatusChangeRequest};
use super::response::{ApiError, ApiErrorResponse, PdfJobAccepted};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/invoices", post(create_handler))
        .route("/invoices/preview", post(preview_handler))
        .route("/invoices/:id", get(get_handler).delete(delete_handler))
        .route("/invoices/:id/status", post(status_handler))
        .route("/invoices/:id/pdf", post(pdf_handler))
        .with_state(state)
}

/// Handler for POST /invoices/preview.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing invoice preview request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };

    match state.engine().preview_invoice(&request) {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(err) => engine_error(correlation_id, "Invoice preview failed", err),
    }
}

/// Handler for POST /invoices.
async fn create_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing invoice creation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };

    match state.engine().create_invoice(request) {
        Ok(invoice) => {
            info!(
                correlation_id = %correlation_id,
                invoice_id = %invoice.id,
                invoice_number = %invoice.invoice_number,
                "Invoice creation completed"
            );
            json_response(StatusCode::CREATED, &invoice)
        }
        Err(err) => engine_error(correlation_id, "Invoice creation failed", err),
    }
}

/// Handler for GET /invoices/:id.
async fn get_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();

    let invoice_id = match parse_invoice_id(&id) {
        Ok(invoice_id) => invoice_id,
        Err(err) => return err.into_response(),
    };

    match state.engine().get_invoice(invoice_id) {
        Ok(invoice) => json_response(StatusCode::OK, &invoice),
        Err(err) => engine_error(correlation_id, "Invoice lookup failed", err),
    }
}

/// Handler for POST /invoices/:id/status.
async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, invoice_id = %id, "Processing status change request");

    let invoice_id = match parse_invoice_id(&id) {
        Ok(invoice_id) => invoice_id,
        Err(err) => return err.into_response(),
    };
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };

    match state
        .engine()
        .transition_invoice_status(invoice_id, request.status)
    {
        Ok(invoice) => json_response(StatusCode::OK, &invoice),
        Err(err) => engine_error(correlation_id, "Status change failed", err),
    }
}

/// Handler for DELETE /invoices/:id.
async fn delete_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, invoice_id = %id, "Processing invoice deletion request");

    let invoice_id = match parse_invoice_id(&id) {
        Ok(invoice_id) => invoice_id,
        Err(err) => return err.into_response(),
    };

    match state.engine().delete_invoice(invoice_id) {
        Ok(outcome) => json_response(StatusCode::OK, &outcome),
        Err(err) => engine_error(correlation_id, "Invoice deletion failed", err),
    }
}

/// Handler for POST /invoices/:id/pdf.
async fn pdf_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PdfRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, invoice_id = %id, "Processing PDF request");

    let invoice_id = match parse_invoice_id(&id) {
        Ok(invoice_id) => invoice_id,
        Err(err) => return err.into_response(),
    };
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };

    match state
        .engine()
        .request_pdf(invoice_id, request.include_detailed, &request.requested_by)
    {
        Ok(job_id) => json_response(
            StatusCode::ACCEPTED,
            &PdfJobAccepted { job_id, invoice_id },
        ),
        Err(err) => engine_error(correlation_id, "PDF request failed", err),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn engine_error(correlation_id: Uuid, context: &'static str, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "{}", context
    );
    ApiErrorResponse::from(err).into_response()
}

fn parse_invoice_id(id: &str) -> Result<Uuid, ApiErrorResponse> {
    Uuid::parse_str(id).map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::with_details(
            "VALIDATION_ERROR",
            format!("Invalid invoice id: {}", id),
            "invoice_id",
        ))
    })
}

fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> ApiErrorResponse {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error)
}
