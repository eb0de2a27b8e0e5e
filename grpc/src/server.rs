//! Routes gRPC calls to [`TodoListService`].
//!
//! [`TodoListServer`] is the tower service tonic's router expects: it matches
//! the request path, decodes the protobuf frame with [`ProstCodec`] and runs
//! the matching unary handler. Unknown methods answer `UNIMPLEMENTED`.

use crate::service::TodoListService;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::codec::ProstCodec;
use tonic::codegen::{Body, StdError};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::{Code, Status};

/// Fully qualified service name.
pub const SERVICE_NAME: &str = "todo.v1beta1.TodoList";

/// Path of the `CreateTodo` method.
pub const CREATE_TODO_PATH: &str = "/todo.v1beta1.TodoList/CreateTodo";
/// Path of the `ListTodos` method.
pub const LIST_TODOS_PATH: &str = "/todo.v1beta1.TodoList/ListTodos";
/// Path of the `MarkAsDone` method.
pub const MARK_AS_DONE_PATH: &str = "/todo.v1beta1.TodoList/MarkAsDone";

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Adapts a closure to tonic's [`UnaryService`].
struct Unary<F>(F);

impl<F, Req, Resp, Fut> UnaryService<Req> for Unary<F>
where
    F: FnMut(tonic::Request<Req>) -> Fut,
    Fut: Future<Output = Result<tonic::Response<Resp>, Status>>,
{
    type Response = Resp;
    type Future = Fut;

    fn call(&mut self, request: tonic::Request<Req>) -> Self::Future {
        (self.0)(request)
    }
}

/// Tower service for `todo.v1beta1.TodoList`.
#[derive(Debug, Clone)]
pub struct TodoListServer {
    service: Arc<TodoListService>,
}

impl TodoListServer {
    /// Serve `service`.
    #[must_use]
    pub fn new(service: TodoListService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl NamedService for TodoListServer {
    const NAME: &'static str = SERVICE_NAME;
}

impl<B> tower::Service<http::Request<B>> for TodoListServer
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let service = Arc::clone(&self.service);

        match request.uri().path() {
            CREATE_TODO_PATH => Box::pin(async move {
                let method = Unary(move |request| {
                    let service = Arc::clone(&service);
                    async move { service.create_todo(request).await }
                });
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(method, request).await)
            }),
            LIST_TODOS_PATH => Box::pin(async move {
                let method = Unary(move |request| {
                    let service = Arc::clone(&service);
                    async move { service.list_todos(request).await }
                });
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(method, request).await)
            }),
            MARK_AS_DONE_PATH => Box::pin(async move {
                let method = Unary(move |request| {
                    let service = Arc::clone(&service);
                    async move { service.mark_as_done(request).await }
                });
                let mut grpc = Grpc::new(ProstCodec::default());
                Ok(grpc.unary(method, request).await)
            }),
            path => {
                tracing::debug!(path, "Unknown gRPC method");
                Box::pin(async move { Ok(unimplemented()) })
            }
        }
    }
}

fn unimplemented() -> http::Response<tonic::body::Body> {
    let mut response = http::Response::new(tonic::body::Body::default());
    let headers = response.headers_mut();
    headers.insert(Status::GRPC_STATUS, (Code::Unimplemented as i32).into());
    headers.insert(
        http::header::CONTENT_TYPE,
        tonic::metadata::GRPC_CONTENT_TYPE,
    );
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use todokit_testing::TestService;
    use tower::Service;

    #[tokio::test]
    async fn unknown_methods_are_unimplemented() {
        let service = TestService::builder().build();
        let mut server = TodoListServer::new(TodoListService::new(
            service.endpoints.clone(),
            service.errors.clone(),
        ));

        let request = http::Request::builder()
            .uri("/todo.v1beta1.TodoList/DeleteTodo")
            .body(tonic::body::Body::default())
            .unwrap();
        let response = server.call(request).await.unwrap();

        assert_eq!(
            response.headers().get(Status::GRPC_STATUS).unwrap(),
            "12"
        );
        assert!(service.errors.is_empty());
    }
}
