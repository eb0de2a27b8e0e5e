//! Axum handler serving the schema at `POST /graphql`.

use crate::schema::TodoSchema;
use axum::{Json, Router, extract::State, routing::post};
use todokit_web::{CorrelationId, correlation_id_layer};
use tower_http::trace::TraceLayer;

/// Execute one GraphQL request.
///
/// The request's correlation ID is made available to resolvers as context
/// data. Resolver failures travel inside the response, so the status is
/// always 200 once the body decodes.
pub async fn graphql_handler(
    State(schema): State<TodoSchema>,
    correlation_id: CorrelationId,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let response = schema.execute(request.data(correlation_id)).await;

    if response.is_err() {
        tracing::debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }

    Json(response)
}

/// The `/graphql` route with correlation tracking and request tracing.
#[must_use]
pub fn router(schema: TodoSchema) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .with_state(schema)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
