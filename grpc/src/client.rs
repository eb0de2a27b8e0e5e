//! Client for `todo.v1beta1.TodoList`.

use crate::proto;
use crate::server::{CREATE_TODO_PATH, LIST_TODOS_PATH, MARK_AS_DONE_PATH};
use tonic::codec::ProstCodec;
use tonic::codegen::{Body, Bytes, StdError};
use tonic::transport::{Channel, Endpoint};
use tonic::{IntoRequest, Response, Status};

/// Typed client over any gRPC transport.
#[derive(Debug, Clone)]
pub struct TodoListClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl TodoListClient<Channel> {
    /// Connect to `dst`, e.g. `http://127.0.0.1:8001`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the address is invalid or the connection
    /// fails.
    pub async fn connect(dst: String) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::new(dst)?.connect().await?;
        Ok(Self::new(channel))
    }
}

impl<T> TodoListClient<T>
where
    T: tonic::client::GrpcService<tonic::body::Body>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    /// Wrap a transport.
    pub fn new(inner: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(inner),
        }
    }

    /// Call `CreateTodo`.
    ///
    /// # Errors
    ///
    /// The status returned by the server.
    pub async fn create_todo(
        &mut self,
        request: impl IntoRequest<proto::CreateTodoRequest>,
    ) -> Result<Response<proto::CreateTodoResponse>, Status> {
        self.unary(request, CREATE_TODO_PATH).await
    }

    /// Call `ListTodos`.
    ///
    /// # Errors
    ///
    /// The status returned by the server.
    pub async fn list_todos(
        &mut self,
        request: impl IntoRequest<proto::ListTodosRequest>,
    ) -> Result<Response<proto::ListTodosResponse>, Status> {
        self.unary(request, LIST_TODOS_PATH).await
    }

    /// Call `MarkAsDone`.
    ///
    /// # Errors
    ///
    /// The status returned by the server.
    pub async fn mark_as_done(
        &mut self,
        request: impl IntoRequest<proto::MarkAsDoneRequest>,
    ) -> Result<Response<proto::MarkAsDoneResponse>, Status> {
        self.unary(request, MARK_AS_DONE_PATH).await
    }

    async fn unary<Req, Resp>(
        &mut self,
        request: impl IntoRequest<Req>,
        path: &'static str,
    ) -> Result<Response<Resp>, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner.ready().await.map_err(|err| {
            let err: StdError = err.into();
            Status::unknown(format!("Service was not ready: {err}"))
        })?;

        let path = http::uri::PathAndQuery::from_static(path);
        self.inner
            .unary(request.into_request(), path, ProstCodec::default())
            .await
    }
}
