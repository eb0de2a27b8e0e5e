//! Protobuf messages of `todo.v1beta1`.
//!
//! Written by hand to match:
//!
//! ```protobuf
//! syntax = "proto3";
//! package todo.v1beta1;
//!
//! service TodoList {
//!   rpc CreateTodo(CreateTodoRequest) returns (CreateTodoResponse);
//!   rpc ListTodos(ListTodosRequest) returns (ListTodosResponse);
//!   rpc MarkAsDone(MarkAsDoneRequest) returns (MarkAsDoneResponse);
//! }
//!
//! message Todo { string id = 1; string text = 2; bool done = 3; }
//! message CreateTodoRequest { string text = 1; }
//! message CreateTodoResponse { string id = 1; }
//! message ListTodosRequest {}
//! message ListTodosResponse { repeated Todo todos = 1; }
//! message MarkAsDoneRequest { string id = 1; }
//! message MarkAsDoneResponse {}
//! ```

use todokit_core::todo;

/// A todo item.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct Todo {
    /// Unique identifier.
    #[prost(string, tag = "1")]
    pub id: String,
    /// What to do.
    #[prost(string, tag = "2")]
    pub text: String,
    /// Whether it has been done.
    #[prost(bool, tag = "3")]
    pub done: bool,
}

impl From<todo::Todo> for Todo {
    fn from(todo: todo::Todo) -> Self {
        Self {
            id: todo.id,
            text: todo.text,
            done: todo.done,
        }
    }
}

/// `CreateTodo` input.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct CreateTodoRequest {
    /// What to do.
    #[prost(string, tag = "1")]
    pub text: String,
}

/// `CreateTodo` output.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct CreateTodoResponse {
    /// ID of the new todo.
    #[prost(string, tag = "1")]
    pub id: String,
}

/// `ListTodos` input.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub struct ListTodosRequest {}

/// `ListTodos` output.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct ListTodosResponse {
    /// Every todo, done or not.
    #[prost(message, repeated, tag = "1")]
    pub todos: Vec<Todo>,
}

/// `MarkAsDone` input.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct MarkAsDoneRequest {
    /// ID of the todo.
    #[prost(string, tag = "1")]
    pub id: String,
}

/// `MarkAsDone` output.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub struct MarkAsDoneResponse {}
