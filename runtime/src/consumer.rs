//! Event bus consumer with automatic resubscription.
//!
//! [`EventConsumer`] owns the subscribe-process-resubscribe loop; what happens
//! to each event is up to an [`EventHandler`]. Typed handlers for todo events
//! plug in through [`MarkedAsDoneEventHandler`].
//!
//! ```text
//! loop {
//!     subscribe (retry after delay on failure)
//!     for each event:
//!         handle, log failures, keep going
//!     stream ended: resubscribe after delay
//! } until shutdown
//! ```
//!
//! Delivery is at-least-once and unordered, so handlers must tolerate
//! duplicates.

use crate::metrics::EVENTS_CONSUMED_TOTAL;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use todokit_core::event::{EventError, SerializedEvent};
use todokit_core::event_bus::{EventBus, EventBusError, EventStream};
use todokit_core::events::{MARKED_AS_DONE, MarkedAsDone};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Default delay before resubscribing.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Errors returned by event handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The payload did not decode.
    #[error(transparent)]
    Decode(#[from] EventError),

    /// The handler's side effect failed.
    #[error("event handler failed: {0}")]
    Failed(String),
}

/// Processes one delivered event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle `event`.
    ///
    /// # Errors
    ///
    /// Errors are logged by the consumer; they never stop it.
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError>;
}

/// Reacts to [`MarkedAsDone`] events.
#[async_trait]
pub trait MarkedAsDoneHandler: Send + Sync {
    /// Handle a decoded event; `correlation_id` comes from the event metadata.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Failed`] if the side effect fails.
    async fn marked_as_done(
        &self,
        event: MarkedAsDone,
        correlation_id: Option<&str>,
    ) -> Result<(), HandlerError>;
}

/// Routes `MarkedAsDone` events to a [`MarkedAsDoneHandler`]; other event
/// types are skipped.
#[derive(Debug, Clone)]
pub struct MarkedAsDoneEventHandler<H> {
    inner: H,
}

impl<H: MarkedAsDoneHandler> MarkedAsDoneEventHandler<H> {
    /// Wrap `inner`.
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: MarkedAsDoneHandler> EventHandler for MarkedAsDoneEventHandler<H> {
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
        if event.event_type != MARKED_AS_DONE {
            tracing::debug!(event_type = %event.event_type, "Skipping unrelated event");
            return Ok(());
        }

        let decoded: MarkedAsDone = event.decode()?;
        self.inner
            .marked_as_done(decoded, event.metadata_str("correlation_id"))
            .await
    }
}

/// Logs every [`MarkedAsDone`] event.
///
/// Logging is naturally idempotent, so duplicates are harmless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventHandler;

#[async_trait]
impl MarkedAsDoneHandler for LogEventHandler {
    async fn marked_as_done(
        &self,
        event: MarkedAsDone,
        correlation_id: Option<&str>,
    ) -> Result<(), HandlerError> {
        info!(
            event = MARKED_AS_DONE,
            todo_id = %event.id,
            correlation_id = correlation_id.unwrap_or_default(),
            "todo marked as done"
        );
        Ok(())
    }
}

/// Generic event bus consumer.
///
/// Subscribes with retry, feeds every event to its handler, resubscribes when
/// the stream ends, and stops on the shutdown signal.
pub struct EventConsumer {
    /// Consumer name (for logging and monitoring)
    name: String,

    /// Topics to subscribe to
    topics: Vec<String>,

    /// Event bus to consume from
    event_bus: Arc<dyn EventBus>,

    /// Handler for processing events
    handler: Arc<dyn EventHandler>,

    /// Shutdown signal receiver
    shutdown: broadcast::Receiver<()>,

    /// Delay before resubscribing
    retry_delay: Duration,
}

impl EventConsumer {
    /// Create a consumer with the default retry delay.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        topics: Vec<String>,
        event_bus: Arc<dyn EventBus>,
        handler: Arc<dyn EventHandler>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            topics,
            event_bus,
            handler,
            shutdown,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set custom retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Spawn the consumer as a background task.
    ///
    /// The first subscription happens inside the task, so events published
    /// before it gets scheduled can be missed. Use [`EventConsumer::start`]
    /// when that matters.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Subscribe, then keep consuming in a background task.
    ///
    /// Every event published after this returns reaches the handler. A failed
    /// first subscription is retried by the task like any later one.
    #[must_use]
    pub async fn start(mut self) -> tokio::task::JoinHandle<()> {
        let first = Self::subscribe(self.event_bus.as_ref(), &self.topics).await;
        tokio::spawn(async move {
            self.consume(Some(first)).await;
        })
    }

    /// Run until the shutdown signal fires.
    pub async fn run(&mut self) {
        self.consume(None).await;
    }

    async fn subscribe(
        event_bus: &dyn EventBus,
        topics: &[String],
    ) -> Result<EventStream, EventBusError> {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        event_bus.subscribe(&topics).await
    }

    async fn consume(&mut self, mut first: Option<Result<EventStream, EventBusError>>) {
        info!(consumer = %self.name, "Event consumer started");

        loop {
            let stream = match first.take() {
                Some(result) => result,
                None => tokio::select! {
                    _ = self.shutdown.recv() => break,
                    result = Self::subscribe(self.event_bus.as_ref(), &self.topics) => result,
                },
            };

            match stream {
                Ok(mut stream) => {
                    info!(consumer = %self.name, topics = ?self.topics, "Subscribed to event bus");
                    if self.process_stream(&mut stream).await.is_break() {
                        break;
                    }
                    warn!(
                        consumer = %self.name,
                        "Event stream ended, resubscribing in {:?}",
                        self.retry_delay
                    );
                }
                Err(e) => {
                    error!(
                        consumer = %self.name,
                        error = %e,
                        "Failed to subscribe to event bus, retrying in {:?}",
                        self.retry_delay
                    );
                }
            }

            tokio::select! {
                _ = self.shutdown.recv() => break,
                () = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        info!(consumer = %self.name, "Event consumer stopped");
    }

    async fn process_stream(&mut self, stream: &mut EventStream) -> std::ops::ControlFlow<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => return std::ops::ControlFlow::Break(()),
                next = stream.next() => match next {
                    Some(Ok(event)) => self.dispatch(&event).await,
                    Some(Err(e)) => error!(
                        consumer = %self.name,
                        error = %e,
                        "Error receiving event from stream"
                    ),
                    None => return std::ops::ControlFlow::Continue(()),
                },
            }
        }
    }

    async fn dispatch(&self, event: &SerializedEvent) {
        let outcome = match self.handler.handle(event).await {
            Ok(()) => "success",
            Err(e) => {
                error!(
                    consumer = %self.name,
                    event_type = %event.event_type,
                    error = %e,
                    "Failed to handle event"
                );
                "failure"
            }
        };

        metrics::counter!(
            EVENTS_CONSUMED_TOTAL,
            "consumer" => self.name.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

impl std::fmt::Debug for EventConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConsumer")
            .field("name", &self.name)
            .field("topics", &self.topics)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}
