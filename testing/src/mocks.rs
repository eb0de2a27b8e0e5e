//! Mock collaborators for deterministic tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use todokit_core::error::{EventsError, IdGenerationError, StoreError};
use todokit_core::event::SerializedEvent;
use todokit_core::event_bus::{EventBus, EventBusError, EventStream};
use todokit_core::events::{Events, MarkedAsDone};
use todokit_core::idgen::IdGenerator;
use todokit_core::store::Store;
use todokit_core::todo::Todo;
use todokit_runtime::{EndpointError, ErrorHandler};

/// Always returns the same ID.
///
/// # Example
///
/// ```
/// use todokit_core::idgen::IdGenerator;
/// use todokit_testing::mocks::ConstantIdGenerator;
///
/// let ids = ConstantIdGenerator::new("id");
/// assert_eq!(ids.generate().unwrap(), "id");
/// assert_eq!(ids.generate().unwrap(), "id");
/// ```
#[derive(Debug, Clone)]
pub struct ConstantIdGenerator {
    id: String,
}

impl ConstantIdGenerator {
    /// Generator returning `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl IdGenerator for ConstantIdGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        Ok(self.id.clone())
    }
}

/// Returns `{prefix}-0`, `{prefix}-1`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{n}", self.prefix))
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingIdGenerator;

impl IdGenerator for FailingIdGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        Err(IdGenerationError("id generator unavailable".to_string()))
    }
}

/// A [`Store`] whose every operation fails with
/// [`StoreError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn store(&self, _todo: &Todo) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn all(&self) -> Result<Vec<Todo>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Todo, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Records every published event.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<MarkedAsDone>>,
}

impl RecordingEvents {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, in publish order.
    #[must_use]
    pub fn events(&self) -> Vec<MarkedAsDone> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Events for RecordingEvents {
    async fn marked_as_done(&self, event: MarkedAsDone) -> Result<(), EventsError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// [`Events`] that always fails to publish.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEvents;

#[async_trait]
impl Events for FailingEvents {
    async fn marked_as_done(&self, _event: MarkedAsDone) -> Result<(), EventsError> {
        Err(EventsError::Bus(EventBusError::PublishFailed {
            topic: "todo".to_string(),
            reason: "broker unavailable".to_string(),
        }))
    }
}

/// [`EventBus`] whose publish and subscribe always fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEventBus;

impl EventBus for FailingEventBus {
    fn publish(
        &self,
        topic: &str,
        _event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            Err(EventBusError::PublishFailed {
                topic,
                reason: "broker unavailable".to_string(),
            })
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics = topics.iter().map(|t| (*t).to_string()).collect();
        Box::pin(async move {
            Err(EventBusError::SubscriptionFailed {
                topics,
                reason: "broker unavailable".to_string(),
            })
        })
    }
}

/// Records every error it is asked to handle.
#[derive(Debug, Default)]
pub struct RecordingErrorHandler {
    errors: Mutex<Vec<EndpointError>>,
}

impl RecordingErrorHandler {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors handled so far.
    #[must_use]
    pub fn errors(&self) -> Vec<EndpointError> {
        self.errors.lock().unwrap().clone()
    }

    /// Number of errors handled so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// Whether no error was handled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle(&self, err: &EndpointError) {
        self.errors.lock().unwrap().push(err.clone());
    }
}
