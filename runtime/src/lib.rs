//! # Todokit Runtime
//!
//! Everything between a transport and the domain service:
//!
//! - [`endpoint`]: request/response types and the decorated [`Endpoints`]
//! - [`error`]: [`EndpointError`] classification and the [`ErrorHandler`] sink
//! - [`event_bus`]: the in-process [`InMemoryEventBus`]
//! - [`consumer`]: the [`EventConsumer`] loop and todo event handlers
//! - [`metrics`]: metric names and the Prometheus exporter
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use todokit_core::events::EventDispatcher;
//! use todokit_core::idgen::UuidGenerator;
//! use todokit_core::store::InMemoryStore;
//! use todokit_core::todo::TodoList;
//! use todokit_runtime::endpoint::{CreateTodoRequest, Endpoints, Request};
//! use todokit_runtime::event_bus::InMemoryEventBus;
//!
//! # tokio_test::block_on(async {
//! let bus = Arc::new(InMemoryEventBus::new());
//! let todos = TodoList::new(
//!     Arc::new(UuidGenerator),
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(EventDispatcher::new(bus)),
//! );
//! let endpoints = Endpoints::new(Arc::new(todos));
//!
//! let response = endpoints
//!     .create_todo(Request::new(CreateTodoRequest { text: "Buy milk".to_string() }))
//!     .await?;
//! assert!(!response.id.is_empty());
//! # Ok::<(), todokit_runtime::EndpointError>(())
//! # }).unwrap();
//! ```

pub mod consumer;
pub mod endpoint;
pub mod error;
pub mod event_bus;
pub mod metrics;

pub use consumer::{EventConsumer, EventHandler, LogEventHandler, MarkedAsDoneEventHandler};
pub use endpoint::{Endpoints, Request};
pub use error::{ClientErrorFilter, EndpointError, ErrorHandler, LogErrorHandler};
pub use event_bus::InMemoryEventBus;
