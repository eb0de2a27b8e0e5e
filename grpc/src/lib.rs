//! gRPC transport for todokit.
//!
//! Messages and the service router are written by hand with prost derives;
//! there is no build script. The transport only decodes, calls the
//! [`Endpoints`](todokit_runtime::Endpoints) and encodes:
//!
//! | endpoint error           | status             |
//! |--------------------------|--------------------|
//! | business `NotFound`      | `NOT_FOUND`        |
//! | business `InvalidArgument` | `INVALID_ARGUMENT` |
//! | anything else            | `INTERNAL`, message `internal server error` |
//!
//! Every failed call is reported to the
//! [`ErrorHandler`](todokit_runtime::ErrorHandler) exactly once, whatever its
//! classification.
//!
//! # Example
//!
//! ```ignore
//! let server = TodoListServer::new(TodoListService::new(endpoints, error_handler));
//! tonic::transport::Server::builder()
//!     .add_service(server)
//!     .serve(addr)
//!     .await?;
//! ```

pub mod client;
pub mod proto;
pub mod server;
pub mod service;

pub use client::TodoListClient;
pub use server::{SERVICE_NAME, TodoListServer};
pub use service::{CORRELATION_ID_METADATA, TodoListService, to_status};
