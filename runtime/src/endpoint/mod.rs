//! Transport-agnostic endpoints for the todo service.
//!
//! Every domain operation is exposed as a tower [`Service`] from
//! [`Request<T>`] to a typed response, decorated with the same middleware
//! chain (outermost first):
//!
//! ```text
//! correlation ─▶ tracing ─▶ logging ─▶ instrumentation ─▶ client error ─▶ endpoint
//! ```
//!
//! Transports only decode into a request type, call [`Endpoints`], and encode
//! the response or the [`EndpointError`].

mod middleware;

pub use middleware::{
    ClientError, ClientErrorLayer, Correlation, CorrelationLayer, Instrumentation,
    InstrumentationLayer, Logging, LoggingLayer, Tracing, TracingLayer,
};

use crate::error::EndpointError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use todokit_core::error::{TodoError, ValidationError};
use todokit_core::todo::{Todo, TodoList};
use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceBuilder, ServiceExt, service_fn};

/// Operation name of [`Endpoints::create_todo`].
pub const CREATE_TODO: &str = "create_todo";
/// Operation name of [`Endpoints::list_todos`].
pub const LIST_TODOS: &str = "list_todos";
/// Operation name of [`Endpoints::mark_as_done`].
pub const MARK_AS_DONE: &str = "mark_as_done";

/// A decorated endpoint.
pub type BoxEndpoint<Req, Resp> = BoxCloneSyncService<Request<Req>, Resp, EndpointError>;

/// An endpoint request: the decoded payload plus inbound context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<T> {
    /// Correlation identifier supplied by the caller, if any.
    ///
    /// The correlation middleware fills it in when missing.
    pub correlation_id: Option<String>,
    /// Operation input.
    pub payload: T,
}

impl<T> Request<T> {
    /// A request without inbound context.
    pub const fn new(payload: T) -> Self {
        Self {
            correlation_id: None,
            payload,
        }
    }

    /// Attach an inbound correlation identifier.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Input of [`Endpoints::create_todo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    /// Todo text, must not be blank.
    pub text: String,
}

impl CreateTodoRequest {
    /// Check input rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the text is empty or whitespace only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError {
                field: "text",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Output of [`Endpoints::create_todo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoResponse {
    /// ID of the new todo.
    pub id: String,
}

/// Input of [`Endpoints::list_todos`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListTodosRequest;

/// Output of [`Endpoints::list_todos`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTodosResponse {
    /// Every todo, done or not.
    pub todos: Vec<Todo>,
}

/// Input of [`Endpoints::mark_as_done`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAsDoneRequest {
    /// ID of the todo.
    pub id: String,
}

/// Output of [`Endpoints::mark_as_done`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkAsDoneResponse;

/// The decorated endpoints of the todo service.
///
/// Cheap to clone; every transport holds its own copy.
#[derive(Clone)]
pub struct Endpoints {
    create_todo: BoxEndpoint<CreateTodoRequest, CreateTodoResponse>,
    list_todos: BoxEndpoint<ListTodosRequest, ListTodosResponse>,
    mark_as_done: BoxEndpoint<MarkAsDoneRequest, MarkAsDoneResponse>,
}

impl Endpoints {
    /// Build the endpoints of `todos` with the full middleware chain.
    #[must_use]
    pub fn new(todos: Arc<TodoList>) -> Self {
        let create_todo = {
            let todos = Arc::clone(&todos);
            service_fn(move |request: Request<CreateTodoRequest>| {
                let todos = Arc::clone(&todos);
                async move {
                    request.payload.validate()?;
                    let id = todos.create_todo(request.payload.text).await?;
                    Ok::<_, TodoError>(CreateTodoResponse { id })
                }
            })
        };

        let list_todos = {
            let todos = Arc::clone(&todos);
            service_fn(move |_: Request<ListTodosRequest>| {
                let todos = Arc::clone(&todos);
                async move {
                    let todos = todos.list_todos().await?;
                    Ok::<_, TodoError>(ListTodosResponse { todos })
                }
            })
        };

        let mark_as_done = service_fn(move |request: Request<MarkAsDoneRequest>| {
            let todos = Arc::clone(&todos);
            async move {
                todos.mark_as_done(&request.payload.id).await?;
                Ok::<_, TodoError>(MarkAsDoneResponse)
            }
        });

        Self {
            create_todo: decorate(CREATE_TODO, create_todo),
            list_todos: decorate(LIST_TODOS, list_todos),
            mark_as_done: decorate(MARK_AS_DONE, mark_as_done),
        }
    }

    /// Create a todo.
    ///
    /// # Errors
    ///
    /// Business `InvalidArgument` for blank text, internal otherwise.
    pub async fn create_todo(
        &self,
        request: Request<CreateTodoRequest>,
    ) -> Result<CreateTodoResponse, EndpointError> {
        self.create_todo.clone().oneshot(request).await
    }

    /// List all todos.
    ///
    /// # Errors
    ///
    /// Internal errors only; an empty list is not an error.
    pub async fn list_todos(
        &self,
        request: Request<ListTodosRequest>,
    ) -> Result<ListTodosResponse, EndpointError> {
        self.list_todos.clone().oneshot(request).await
    }

    /// Mark a todo as done.
    ///
    /// # Errors
    ///
    /// Business `NotFound` for unknown IDs, internal otherwise.
    pub async fn mark_as_done(
        &self,
        request: Request<MarkAsDoneRequest>,
    ) -> Result<MarkAsDoneResponse, EndpointError> {
        self.mark_as_done.clone().oneshot(request).await
    }
}

impl std::fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoints").finish_non_exhaustive()
    }
}

/// Wrap a raw endpoint in the middleware chain.
pub fn decorate<S, Req, Resp>(operation: &'static str, endpoint: S) -> BoxEndpoint<Req, Resp>
where
    S: Service<Request<Req>, Response = Resp, Error = TodoError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    let service = ServiceBuilder::new()
        .layer(CorrelationLayer)
        .layer(TracingLayer::new(operation))
        .layer(LoggingLayer::new(operation))
        .layer(InstrumentationLayer::new(operation))
        .layer(ClientErrorLayer)
        .service(endpoint);

    BoxCloneSyncService::new(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        for text in ["", "   ", "\n\t"] {
            let request = CreateTodoRequest {
                text: text.to_string(),
            };
            assert!(request.validate().is_err(), "{text:?}");
        }
    }

    #[test]
    fn non_blank_text_is_accepted() {
        let request = CreateTodoRequest {
            text: "My first todo".to_string(),
        };
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn correlation_id_is_optional() {
        let request = Request::new(ListTodosRequest);
        assert_eq!(request.correlation_id, None);

        let request = request.with_correlation_id("corr-1");
        assert_eq!(request.correlation_id.as_deref(), Some("corr-1"));
    }
}
