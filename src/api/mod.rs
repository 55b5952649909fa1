//! HTTP API module for the invoice engine.
//!
//! This module exposes the invoice operations as REST endpoints:
//!
//! | method | path | operation |
//! |--------|------|-----------|
//! | POST | `/invoices/preview` | preview |
//! | POST | `/invoices` | create |
//! | GET | `/invoices/:id` | get |
//! | POST | `/invoices/:id/status` | status transition |
//! | DELETE | `/invoices/:id` | delete or cancel |
//! | POST | `/invoices/:id/pdf` | enqueue PDF generation |

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{PdfRequest, StatusChangeRequest};
pub use response::{ApiError, ApiErrorResponse, PdfJobAccepted};
pub use state::AppState;
