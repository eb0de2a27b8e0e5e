//! Application state for Axum handlers.

use std::sync::Arc;
use todokit_runtime::{EndpointError, Endpoints, ErrorHandler};

/// State shared across all todo handlers.
///
/// Cheap to clone: the endpoints are boxed services and the error handler is
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    /// The decorated todo endpoints.
    pub endpoints: Endpoints,
    error_handler: Arc<dyn ErrorHandler>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(endpoints: Endpoints, error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            endpoints,
            error_handler,
        }
    }

    /// Forward an endpoint error to the error handler.
    pub fn report(&self, err: &EndpointError) {
        self.error_handler.handle(err);
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
