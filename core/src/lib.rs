//! # Todokit Core
//!
//! Domain model and collaborator contracts for the todokit service.
//!
//! The crate owns the todo list invariant and nothing else: transports,
//! middleware and the process wiring live in sibling crates and talk to the
//! domain only through [`todo::TodoList`].
//!
//! ## Collaborators
//!
//! - [`store::Store`]: persists and retrieves todos
//! - [`idgen::IdGenerator`]: produces unique identifiers
//! - [`events::Events`]: publishes domain events
//!
//! Every collaborator is a trait object so adapters (in-memory, read-only,
//! message bus backed) can be swapped without touching the service.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use todokit_core::events::{EventDispatcher, Events};
//! use todokit_core::idgen::UuidGenerator;
//! use todokit_core::store::InMemoryStore;
//! use todokit_core::todo::TodoList;
//! # use todokit_core::event_bus::{EventBus, EventBusError, EventStream};
//! # use todokit_core::event::SerializedEvent;
//! # use std::{future::Future, pin::Pin};
//! # struct NullBus;
//! # impl EventBus for NullBus {
//! #     fn publish(&self, _: &str, _: &SerializedEvent)
//! #         -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
//! #         Box::pin(async { Ok(()) })
//! #     }
//! #     fn subscribe(&self, _: &[&str])
//! #         -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
//! #         Box::pin(async { Ok(Box::pin(futures::stream::empty()) as EventStream) })
//! #     }
//! # }
//!
//! # tokio_test::block_on(async {
//! let events: Arc<dyn Events> = Arc::new(EventDispatcher::new(Arc::new(NullBus)));
//! let todos = TodoList::new(
//!     Arc::new(UuidGenerator),
//!     Arc::new(InMemoryStore::new()),
//!     events,
//! );
//!
//! let id = todos.create_todo("My first todo").await?;
//! todos.mark_as_done(&id).await?;
//! assert!(todos.list_todos().await?[0].done);
//! # Ok::<(), todokit_core::error::TodoError>(())
//! # }).unwrap();
//! ```

pub use serde::{Deserialize, Serialize};

pub mod correlation;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod events;
pub mod idgen;
pub mod store;
pub mod todo;
