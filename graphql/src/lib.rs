//! GraphQL transport for todokit.
//!
//! Resolvers call the same [`Endpoints`](todokit_runtime::Endpoints) as the
//! HTTP and gRPC transports. On failure a resolver reports the error to the
//! [`ErrorHandler`](todokit_runtime::ErrorHandler) and returns a
//! client-safe error instead:
//!
//! - business errors keep their message and carry a `code` extension
//!   (`not_found`, `invalid_argument`)
//! - internal errors become `internal server error`, nothing more
//!
//! # Example
//!
//! ```ignore
//! let schema = todokit_graphql::build_schema(endpoints, error_handler);
//! let app = todokit_web::router(state).merge(todokit_graphql::router(schema));
//! ```

pub mod handler;
pub mod schema;

pub use handler::{graphql_handler, router};
pub use schema::{MutationRoot, NewTodo, QueryRoot, Todo, TodoSchema, build_schema};
