//! The `TodoList` gRPC service over the endpoints.

use crate::proto;
use std::sync::Arc;
use todokit_core::error::BusinessKind;
use todokit_runtime::endpoint::{
    CreateTodoRequest, ListTodosRequest, MarkAsDoneRequest, Request as EndpointRequest,
};
use todokit_runtime::error::INTERNAL_ERROR_MESSAGE;
use todokit_runtime::{EndpointError, Endpoints, ErrorHandler};
use tonic::{Code, Request, Response, Status};

/// Metadata key carrying the correlation ID.
pub const CORRELATION_ID_METADATA: &str = "x-correlation-id";

/// Map an endpoint error to its gRPC status.
///
/// Internal errors never carry their cause over the wire.
#[must_use]
pub fn to_status(err: &EndpointError) -> Status {
    match err.kind() {
        Some(BusinessKind::NotFound) => Status::new(Code::NotFound, err.client_message()),
        Some(BusinessKind::InvalidArgument) => {
            Status::new(Code::InvalidArgument, err.client_message())
        }
        None => Status::new(Code::Internal, INTERNAL_ERROR_MESSAGE),
    }
}

/// Unary handlers of `todo.v1beta1.TodoList`.
#[derive(Clone)]
pub struct TodoListService {
    endpoints: Endpoints,
    error_handler: Arc<dyn ErrorHandler>,
}

impl TodoListService {
    /// Serve `endpoints`, reporting every failure to `error_handler`.
    #[must_use]
    pub fn new(endpoints: Endpoints, error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            endpoints,
            error_handler,
        }
    }

    /// Create a todo.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for blank text, `INTERNAL` otherwise.
    pub async fn create_todo(
        &self,
        request: Request<proto::CreateTodoRequest>,
    ) -> Result<Response<proto::CreateTodoResponse>, Status> {
        let request = decode(request, |message| CreateTodoRequest { text: message.text });
        let result = self.endpoints.create_todo(request).await;

        self.finalize(result)
            .map(|response| Response::new(proto::CreateTodoResponse { id: response.id }))
    }

    /// List every todo.
    ///
    /// # Errors
    ///
    /// `INTERNAL` when the store fails.
    pub async fn list_todos(
        &self,
        request: Request<proto::ListTodosRequest>,
    ) -> Result<Response<proto::ListTodosResponse>, Status> {
        let request = decode(request, |_| ListTodosRequest);
        let result = self.endpoints.list_todos(request).await;

        self.finalize(result).map(|response| {
            Response::new(proto::ListTodosResponse {
                todos: response.todos.into_iter().map(proto::Todo::from).collect(),
            })
        })
    }

    /// Mark a todo as done.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for unknown IDs, `INTERNAL` otherwise.
    pub async fn mark_as_done(
        &self,
        request: Request<proto::MarkAsDoneRequest>,
    ) -> Result<Response<proto::MarkAsDoneResponse>, Status> {
        let request = decode(request, |message| MarkAsDoneRequest { id: message.id });
        let result = self.endpoints.mark_as_done(request).await;

        self.finalize(result)
            .map(|_| Response::new(proto::MarkAsDoneResponse {}))
    }

    /// Report a failed call once, then map it to a status.
    fn finalize<T>(&self, result: Result<T, EndpointError>) -> Result<T, Status> {
        result.map_err(|err| {
            self.error_handler.handle(&err);
            to_status(&err)
        })
    }
}

impl std::fmt::Debug for TodoListService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoListService")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn decode<M, T>(request: Request<M>, convert: impl FnOnce(M) -> T) -> EndpointRequest<T> {
    let correlation_id = request
        .metadata()
        .get(CORRELATION_ID_METADATA)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let request = EndpointRequest::new(convert(request.into_inner()));
    match correlation_id {
        Some(correlation_id) => request.with_correlation_id(correlation_id),
        None => request,
    }
}
