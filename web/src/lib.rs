//! Axum HTTP transport for todokit.
//!
//! Handlers do only mechanical work: decode the wire request, call the
//! [`Endpoints`](todokit_runtime::Endpoints), encode the response or a problem
//! document. No business logic lives here.
//!
//! # Routes
//!
//! | method | path               | success                 |
//! |--------|--------------------|-------------------------|
//! | POST   | `/todos`           | 201 `{"id": "..."}`     |
//! | GET    | `/todos`           | 200 `{"todos": [...]}`  |
//! | POST   | `/todos/{id}/done` | 204                     |
//! | GET    | `/health`          | 200 `ok`                |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use todokit_runtime::{ClientErrorFilter, LogErrorHandler};
//! use todokit_web::{AppState, router};
//!
//! let state = AppState::new(endpoints, Arc::new(ClientErrorFilter::new(LogErrorHandler)));
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use error::{AppError, Problem};
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// The todo routes with correlation tracking and request tracing.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/todos",
            post(handlers::todos::create_todo).get(handlers::todos::list_todos),
        )
        .route("/todos/:id/done", post(handlers::todos::mark_as_done))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
