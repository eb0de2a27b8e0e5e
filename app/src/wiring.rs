//! Composition of the todo service and its transports.
//!
//! ```text
//! IdGenerator ─┐
//! Store ───────┼─► TodoList ─► Endpoints ─┬─► HTTP + /graphql
//! Events ──────┘                          └─► gRPC
//!    │
//!    └─► EventBus ─► EventConsumer ─► LogEventHandler
//! ```

use crate::config::{Config, EventBusKind};
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use todokit_core::event_bus::EventBus;
use todokit_core::events::EventDispatcher;
use todokit_core::idgen::{IdGenerator, UuidGenerator};
use todokit_core::store::{InMemoryStore, Store};
use todokit_core::todo::TodoList;
use todokit_grpc::{TodoListServer, TodoListService};
use todokit_runtime::{
    ClientErrorFilter, Endpoints, ErrorHandler, EventConsumer, InMemoryEventBus,
    LogErrorHandler, LogEventHandler, MarkedAsDoneEventHandler,
};
use tokio::sync::broadcast;

/// Name of the consumer that logs `MarkedAsDone` events.
pub const LOG_CONSUMER_NAME: &str = "log_marked_as_done";

/// Content type of the Prometheus text exposition.
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Collaborators the service is built from.
#[derive(Clone)]
pub struct AppComponents {
    /// Source of todo IDs.
    pub id_generator: Arc<dyn IdGenerator>,
    /// Todo storage.
    pub store: Arc<dyn Store>,
    /// Bus carrying `MarkedAsDone` events.
    pub event_bus: Arc<dyn EventBus>,
    /// Topic events are published to and consumed from.
    pub topic: String,
    /// Sink for errors reported by the transports.
    pub error_handler: Arc<dyn ErrorHandler>,
}

impl AppComponents {
    /// UUID IDs, an empty in-memory store, and an error handler that logs
    /// internal errors only.
    #[must_use]
    pub fn new(event_bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            id_generator: Arc::new(UuidGenerator),
            store: Arc::new(InMemoryStore::new()),
            event_bus,
            topic: topic.into(),
            error_handler: Arc::new(ClientErrorFilter::new(LogErrorHandler)),
        }
    }

    /// Replace the ID generator.
    #[must_use]
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Replace the store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = store;
        self
    }

    /// Replace the error handler.
    #[must_use]
    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }
}

impl std::fmt::Debug for AppComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppComponents")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

/// The service's transports, ready to serve.
#[derive(Debug, Clone)]
pub struct App {
    /// Decorated endpoints shared by every transport.
    pub endpoints: Endpoints,
    /// HTTP routes plus `/graphql`.
    pub http: Router,
    /// gRPC service.
    pub grpc: TodoListServer,
}

/// Build the domain service and every transport over it.
#[must_use]
pub fn build_app(components: &AppComponents) -> App {
    let events = Arc::new(EventDispatcher::with_topic(
        Arc::clone(&components.event_bus),
        components.topic.clone(),
    ));
    let todos = Arc::new(TodoList::new(
        Arc::clone(&components.id_generator),
        Arc::clone(&components.store),
        events,
    ));
    let endpoints = Endpoints::new(todos);
    let error_handler = &components.error_handler;

    let schema = todokit_graphql::build_schema(endpoints.clone(), Arc::clone(error_handler));
    let http = todokit_web::router(todokit_web::AppState::new(
        endpoints.clone(),
        Arc::clone(error_handler),
    ))
    .merge(todokit_graphql::router(schema));

    let grpc = TodoListServer::new(TodoListService::new(
        endpoints.clone(),
        Arc::clone(error_handler),
    ));

    App {
        endpoints,
        http,
        grpc,
    }
}

/// Consumer that logs every `MarkedAsDone` event on the components' topic.
#[must_use]
pub fn log_consumer(
    components: &AppComponents,
    shutdown: broadcast::Receiver<()>,
) -> EventConsumer {
    EventConsumer::new(
        LOG_CONSUMER_NAME,
        vec![components.topic.clone()],
        Arc::clone(&components.event_bus),
        Arc::new(MarkedAsDoneEventHandler::new(LogEventHandler)),
        shutdown,
    )
}

/// Liveness and Prometheus metrics for operators.
pub fn maintenance_router(metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(todokit_web::handlers::health::health_check))
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], metrics.render())
}

/// The event bus selected by `config`.
///
/// # Errors
///
/// Fails if the selection is unknown, or the redpanda bus is selected but
/// cannot be created or the binary lacks the `redpanda` feature.
pub fn event_bus(config: &Config) -> anyhow::Result<Arc<dyn EventBus>> {
    match config.event_bus_kind()? {
        EventBusKind::Memory => Ok(Arc::new(InMemoryEventBus::new())),
        EventBusKind::Redpanda => redpanda_bus(config),
    }
}

#[cfg(feature = "redpanda")]
fn redpanda_bus(config: &Config) -> anyhow::Result<Arc<dyn EventBus>> {
    use anyhow::Context as _;

    let brokers = config
        .redpanda
        .brokers
        .as_deref()
        .ok_or(crate::config::ConfigError::MissingBrokers)?;

    let mut builder = todokit_redpanda::RedpandaEventBus::builder().brokers(brokers);
    if let Some(group) = &config.redpanda.consumer_group {
        builder = builder.consumer_group(group.clone());
    }

    let bus = builder
        .build()
        .context("failed to create redpanda event bus")?;
    Ok(Arc::new(bus))
}

#[cfg(not(feature = "redpanda"))]
fn redpanda_bus(_config: &Config) -> anyhow::Result<Arc<dyn EventBus>> {
    anyhow::bail!("redpanda event bus requested but todokit was built without the `redpanda` feature")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_bus_is_the_default() {
        assert!(event_bus(&Config::default()).is_ok());
    }

    #[test]
    fn unknown_bus_is_an_error() {
        let config = Config {
            event_bus: "nats".to_string(),
            ..Config::default()
        };

        let err = event_bus(&config).err().unwrap();
        assert!(err.to_string().contains("nats"));
    }

    #[cfg(not(feature = "redpanda"))]
    #[test]
    fn redpanda_needs_the_feature() {
        let config = Config {
            event_bus: "redpanda".to_string(),
            ..Config::default()
        };

        let err = event_bus(&config).err().unwrap();
        assert!(err.to_string().contains("`redpanda` feature"));
    }
}
