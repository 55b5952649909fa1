//! Application state for the invoice engine API.

use std::sync::Arc;

use crate::invoicing::InvoiceEngine;

/// Shared application state.
///
/// Holds the invoice engine every request handler works through.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<InvoiceEngine>,
}

impl AppState {
    /// Creates a new application state around an engine.
    pub fn new(engine: Arc<InvoiceEngine>) -> Self {
        Self { engine }
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &InvoiceEngine {
        &self.engine
    }
}
