//! In-process [`EventBus`] backed by tokio broadcast channels.
//!
//! Each topic gets its own channel. Subscribers receive events published
//! after they subscribed; a subscriber that falls more than the channel
//! capacity behind skips the oldest events and a warning is logged.
//! Publishing to a topic nobody listens to drops the event.

use crate::metrics::EVENTS_PUBLISHED_TOTAL;
use futures::stream::{self, Stream};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use todokit_core::event::SerializedEvent;
use todokit_core::event_bus::{EventBus, EventBusError, EventStream};
use tokio::sync::{Mutex, broadcast};

/// Default per-topic channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process publish/subscribe.
#[derive(Debug)]
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, broadcast::Sender<SerializedEvent>>>,
    capacity: usize,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    /// A bus with [`DEFAULT_CAPACITY`] per topic.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A bus buffering up to `capacity` events per topic.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .await
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<SerializedEvent> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

fn receiver_stream(
    topic: String,
    mut receiver: broadcast::Receiver<SerializedEvent>,
) -> impl Stream<Item = Result<SerializedEvent, EventBusError>> + Send {
    async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => yield Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %topic, skipped, "Subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            let sender = self.sender(&topic).await;
            let receivers = sender.send(event).unwrap_or(0);

            metrics::counter!(EVENTS_PUBLISHED_TOTAL, "topic" => topic.clone()).increment(1);
            tracing::trace!(topic = %topic, receivers, "Event published");
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let mut streams = Vec::with_capacity(topics.len());
            for topic in topics {
                let receiver = self.sender(&topic).await.subscribe();
                streams.push(Box::pin(receiver_stream(topic, receiver)));
            }

            Ok(Box::pin(stream::select_all(streams)) as EventStream)
        })
    }
}
