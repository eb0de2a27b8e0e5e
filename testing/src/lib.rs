//! # Todokit Testing
//!
//! Testing utilities and helpers for todokit.
//!
//! This crate provides:
//! - Mock collaborators ([`mocks`]): fixed and failing ID generators, stores,
//!   event publishers and buses, and a recording error handler
//! - A log capture layer ([`logs`]) for asserting on `tracing` output
//! - [`TestService`], a fully wired service for transport tests
//!
//! ## Example
//!
//! ```
//! use todokit_runtime::endpoint::{ListTodosRequest, Request};
//! use todokit_testing::TestService;
//!
//! # tokio_test::block_on(async {
//! let service = TestService::builder().with_todo("id", "Do me").build();
//!
//! let response = service.endpoints.list_todos(Request::new(ListTodosRequest)).await.unwrap();
//! assert_eq!(response.todos.len(), 1);
//! # });
//! ```

pub mod logs;
pub mod mocks;

use std::sync::Arc;
use todokit_core::events::Events;
use todokit_core::idgen::IdGenerator;
use todokit_core::store::{InMemoryStore, ReadOnlyStore, Store};
use todokit_core::todo::{Todo, TodoList};
use todokit_runtime::Endpoints;

pub use logs::{CapturedEvent, LogCapture};
pub use mocks::{
    ConstantIdGenerator, FailingEventBus, FailingEvents, FailingIdGenerator, FailingStore,
    RecordingErrorHandler, RecordingEvents, SequentialIdGenerator,
};

/// A service wired with in-memory collaborators.
///
/// `store` and `events` are the same instances the service uses, so tests
/// can inspect them after calling through `endpoints`.
pub struct TestService {
    /// Backing store.
    pub store: Arc<InMemoryStore>,
    /// Published events.
    pub events: Arc<RecordingEvents>,
    /// Recording sink for transports that report errors.
    pub errors: Arc<RecordingErrorHandler>,
    /// The decorated endpoints.
    pub endpoints: Endpoints,
}

impl TestService {
    /// Start configuring a service.
    #[must_use]
    pub fn builder() -> TestServiceBuilder {
        TestServiceBuilder::default()
    }
}

/// Builder for [`TestService`].
#[derive(Default)]
pub struct TestServiceBuilder {
    todos: Vec<Todo>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn Events>>,
    read_only: bool,
    failing_store: bool,
}

impl TestServiceBuilder {
    /// Pre-populate the store.
    #[must_use]
    pub fn with_todo(mut self, id: &str, text: &str) -> Self {
        self.todos.push(Todo::new(id, text));
        self
    }

    /// Use a specific ID generator (default: sequential `id-N`).
    #[must_use]
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(ids));
        self
    }

    /// Publish through `events` instead of the recorder.
    #[must_use]
    pub fn events(mut self, events: impl Events + 'static) -> Self {
        self.events = Some(Arc::new(events));
        self
    }

    /// Wrap the store so that writes fail.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Replace the store with one that always fails.
    #[must_use]
    pub const fn failing_store(mut self) -> Self {
        self.failing_store = true;
        self
    }

    /// Wire the service.
    #[must_use]
    pub fn build(self) -> TestService {
        let store = Arc::new(InMemoryStore::with_todos(self.todos));
        let recorder = Arc::new(RecordingEvents::new());

        let service_store: Arc<dyn Store> = if self.failing_store {
            Arc::new(FailingStore)
        } else if self.read_only {
            Arc::new(ReadOnlyStore::new(Arc::clone(&store)))
        } else {
            store.clone()
        };
        let events: Arc<dyn Events> = self
            .events
            .unwrap_or_else(|| recorder.clone() as Arc<dyn Events>);
        let id_generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(SequentialIdGenerator::default()) as Arc<dyn IdGenerator>);

        let todos = TodoList::new(id_generator, service_store, events);

        TestService {
            store,
            events: recorder,
            errors: Arc::new(RecordingErrorHandler::new()),
            endpoints: Endpoints::new(Arc::new(todos)),
        }
    }
}
