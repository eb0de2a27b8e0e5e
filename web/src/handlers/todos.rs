//! Todo handlers.
//!
//! Each handler decodes the wire request, calls the endpoint with the
//! request's correlation ID, and encodes the result. Endpoint errors are
//! reported to the error handler once, then rendered as problem documents.

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use todokit_runtime::EndpointError;
use todokit_runtime::endpoint::{
    CreateTodoRequest, CreateTodoResponse, ListTodosRequest, ListTodosResponse,
    MarkAsDoneRequest, Request,
};

fn fail(state: &AppState, err: EndpointError) -> AppError {
    state.report(&err);
    AppError::from(err)
}

/// Create a todo.
///
/// ```text
/// POST /todos  {"text": "..."}  ->  201 {"id": "..."}
/// ```
///
/// # Errors
///
/// 400 for malformed bodies and blank text, 500 otherwise.
pub async fn create_todo(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<CreateTodoResponse>)> {
    let Json(payload) = body?;
    let request = Request::new(payload).with_correlation_id(correlation_id.to_string());

    let response = state
        .endpoints
        .create_todo(request)
        .await
        .map_err(|err| fail(&state, err))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// List every todo.
///
/// ```text
/// GET /todos  ->  200 {"todos": [{"id": "...", "text": "...", "done": false}]}
/// ```
///
/// # Errors
///
/// 500 when the store fails.
pub async fn list_todos(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<Json<ListTodosResponse>> {
    let request = Request::new(ListTodosRequest).with_correlation_id(correlation_id.to_string());

    let response = state
        .endpoints
        .list_todos(request)
        .await
        .map_err(|err| fail(&state, err))?;

    Ok(Json(response))
}

/// Mark a todo as done.
///
/// ```text
/// POST /todos/{id}/done  ->  204
/// ```
///
/// # Errors
///
/// 404 for unknown IDs, 500 otherwise.
pub async fn mark_as_done(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    let request =
        Request::new(MarkAsDoneRequest { id }).with_correlation_id(correlation_id.to_string());

    state
        .endpoints
        .mark_as_done(request)
        .await
        .map_err(|err| fail(&state, err))?;

    Ok(StatusCode::NO_CONTENT)
}
