//! Error responses for HTTP handlers.
//!
//! Every failure renders as an RFC 7807 problem document with content type
//! `application/problem+json`:
//!
//! ```json
//! { "type": "about:blank", "title": "Not Found", "status": 404,
//!   "detail": "failed to mark todo as done: todo not found" }
//! ```
//!
//! Internal errors never leak their cause; their detail is always
//! [`INTERNAL_ERROR_MESSAGE`].

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use todokit_core::error::BusinessKind;
use todokit_runtime::EndpointError;
use todokit_runtime::error::INTERNAL_ERROR_MESSAGE;

/// Content type of problem documents.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Application error type for web handlers.
///
/// Holds only what goes over the wire. Reporting to the error handler happens
/// in the handler, before conversion, so `into_response` never logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Client-safe description
    detail: String,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// Create a 500 Internal Server Error with the generic message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    /// The response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The problem detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.detail)
    }
}

impl std::error::Error for AppError {}

impl From<&EndpointError> for AppError {
    fn from(err: &EndpointError) -> Self {
        match err.kind() {
            Some(BusinessKind::NotFound) => Self::not_found(err.client_message()),
            Some(BusinessKind::InvalidArgument) => Self::bad_request(err.client_message()),
            None => Self::internal(),
        }
    }
}

impl From<EndpointError> for AppError {
    fn from(err: EndpointError) -> Self {
        Self::from(&err)
    }
}

/// Malformed or mistyped request bodies are the caller's fault.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Problem document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the status.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Explanation specific to this occurrence.
    pub detail: String,
}

impl From<&AppError> for Problem {
    fn from(err: &AppError) -> Self {
        Self {
            kind: "about:blank".to_string(),
            title: err
                .status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            status: err.status.as_u16(),
            detail: err.detail.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(Problem::from(&self))).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use todokit_core::error::{
        MARK_AS_DONE_CONTEXT, NotFoundError, StoreError, TodoError, ValidationError,
    };

    fn not_found() -> EndpointError {
        EndpointError::classify(
            TodoError::from(StoreError::from(NotFoundError::new("id")))
                .context(MARK_AS_DONE_CONTEXT),
        )
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(not_found()).status(), StatusCode::NOT_FOUND);

        let invalid = EndpointError::classify(TodoError::from(ValidationError {
            field: "text",
            reason: "must not be empty",
        }));
        assert_eq!(AppError::from(invalid).status(), StatusCode::BAD_REQUEST);

        let internal = EndpointError::classify(TodoError::from(StoreError::ReadOnly));
        let err = AppError::from(internal);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_problem_document() {
        let problem = Problem::from(&AppError::from(not_found()));

        assert_eq!(
            serde_json::to_value(&problem).unwrap(),
            serde_json::json!({
                "type": "about:blank",
                "title": "Not Found",
                "status": 404,
                "detail": "failed to mark todo as done: todo not found",
            })
        );
    }

    #[test]
    fn test_problem_content_type() {
        let response = AppError::internal().into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );
    }
}
