//! Domain events and their publisher.

use crate::correlation;
use crate::error::EventsError;
use crate::event::{Event, SerializedEvent};
use crate::event_bus::EventBus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Topic todo events are published on.
pub const TODO_TOPIC: &str = "todo";

/// Event type name of [`MarkedAsDone`].
pub const MARKED_AS_DONE: &str = "MarkedAsDone";

/// A todo was marked as done.
///
/// On the wire: `{"ID": "<todo id>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedAsDone {
    /// ID of the todo.
    #[serde(rename = "ID")]
    pub id: String,
}

impl Event for MarkedAsDone {
    fn event_type(&self) -> &'static str {
        MARKED_AS_DONE
    }
}

/// Publishes todo domain events.
#[async_trait]
pub trait Events: Send + Sync {
    /// Publish a [`MarkedAsDone`] event.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError`] if the event cannot be encoded or published.
    async fn marked_as_done(&self, event: MarkedAsDone) -> Result<(), EventsError>;
}

/// [`Events`] implementation that publishes JSON events on an [`EventBus`].
///
/// The correlation identifier of the calling request, when there is one,
/// is attached as `correlation_id` metadata.
#[derive(Clone)]
pub struct EventDispatcher {
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl EventDispatcher {
    /// Publish on [`TODO_TOPIC`].
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self::with_topic(bus, TODO_TOPIC)
    }

    /// Publish on a custom topic.
    #[must_use]
    pub fn with_topic(bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Topic events are published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Events for EventDispatcher {
    async fn marked_as_done(&self, event: MarkedAsDone) -> Result<(), EventsError> {
        let metadata = correlation::current()
            .map(|correlation_id| serde_json::json!({ "correlation_id": correlation_id }));
        let serialized = SerializedEvent::from_event(&event, metadata)?;

        self.bus.publish(&self.topic, &serialized).await?;

        tracing::debug!(
            topic = %self.topic,
            event_type = MARKED_AS_DONE,
            todo_id = %event.id,
            "Event published"
        );
        Ok(())
    }
}
