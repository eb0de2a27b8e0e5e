//! Schema, types and resolvers.
//!
//! ```graphql
//! type Todo { id: ID!, text: String!, done: Boolean! }
//! input NewTodo { text: String! }
//!
//! type Query { todos: [Todo!]! }
//! type Mutation {
//!   createTodo(input: NewTodo!): ID!
//!   markTodoAsDone(input: ID!): Boolean!
//! }
//! ```

use async_graphql::{
    Context, EmptySubscription, Error, ErrorExtensions, ID, InputObject, Object, Result, Schema,
    SimpleObject,
};
use std::sync::Arc;
use todokit_core::todo;
use todokit_runtime::endpoint::{
    CreateTodoRequest, ListTodosRequest, MarkAsDoneRequest, Request,
};
use todokit_runtime::error::INTERNAL_ERROR_MESSAGE;
use todokit_runtime::{EndpointError, Endpoints, ErrorHandler};
use todokit_web::CorrelationId;

/// The executable todo schema.
pub type TodoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema over `endpoints`.
///
/// Every endpoint error is passed to `error_handler` before it becomes a
/// resolver error.
#[must_use]
pub fn build_schema(endpoints: Endpoints, error_handler: Arc<dyn ErrorHandler>) -> TodoSchema {
    let resolver = Resolver {
        endpoints,
        error_handler,
    };

    Schema::build(
        QueryRoot {
            resolver: resolver.clone(),
        },
        MutationRoot { resolver },
        EmptySubscription,
    )
    .finish()
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct Todo {
    /// Unique identifier.
    pub id: ID,
    /// What to do.
    pub text: String,
    /// Whether it has been done.
    pub done: bool,
}

impl From<todo::Todo> for Todo {
    fn from(todo: todo::Todo) -> Self {
        Self {
            id: ID(todo.id),
            text: todo.text,
            done: todo.done,
        }
    }
}

/// Input of `createTodo`.
#[derive(Debug, Clone, InputObject)]
pub struct NewTodo {
    /// What to do.
    pub text: String,
}

#[derive(Clone)]
struct Resolver {
    endpoints: Endpoints,
    error_handler: Arc<dyn ErrorHandler>,
}

impl Resolver {
    /// Report `err` and turn it into a client-safe resolver error.
    fn fail(&self, err: &EndpointError) -> Error {
        self.error_handler.handle(err);

        match err.kind() {
            Some(kind) => {
                Error::new(err.client_message()).extend_with(|_, ext| ext.set("code", kind.as_str()))
            }
            None => Error::new(INTERNAL_ERROR_MESSAGE),
        }
    }
}

fn request<T>(ctx: &Context<'_>, payload: T) -> Request<T> {
    let request = Request::new(payload);
    match ctx.data_opt::<CorrelationId>() {
        Some(correlation_id) => request.with_correlation_id(correlation_id.to_string()),
        None => request,
    }
}

/// Root query object.
pub struct QueryRoot {
    resolver: Resolver,
}

#[Object]
impl QueryRoot {
    /// Every todo, done or not.
    async fn todos(&self, ctx: &Context<'_>) -> Result<Vec<Todo>> {
        let response = self
            .resolver
            .endpoints
            .list_todos(request(ctx, ListTodosRequest))
            .await
            .map_err(|err| self.resolver.fail(&err))?;

        Ok(response.todos.into_iter().map(Todo::from).collect())
    }
}

/// Root mutation object.
pub struct MutationRoot {
    resolver: Resolver,
}

#[Object]
impl MutationRoot {
    /// Create a todo and return its ID.
    async fn create_todo(&self, ctx: &Context<'_>, input: NewTodo) -> Result<ID> {
        let response = self
            .resolver
            .endpoints
            .create_todo(request(ctx, CreateTodoRequest { text: input.text }))
            .await
            .map_err(|err| self.resolver.fail(&err))?;

        Ok(ID(response.id))
    }

    /// Mark a todo as done.
    async fn mark_todo_as_done(&self, ctx: &Context<'_>, input: ID) -> Result<bool> {
        self.resolver
            .endpoints
            .mark_as_done(request(ctx, MarkAsDoneRequest { id: input.0 }))
            .await
            .map_err(|err| self.resolver.fail(&err))?;

        Ok(true)
    }
}
