//! Endpoint layer: middleware chain, classification and context propagation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures::StreamExt;
use std::sync::Arc;
use todokit_core::error::BusinessKind;
use todokit_core::events::{EventDispatcher, MarkedAsDone};
use todokit_core::store::{InMemoryStore, Store};
use todokit_core::event_bus::EventBus;
use todokit_core::todo::{Todo, TodoList};
use todokit_runtime::endpoint::{
    CreateTodoRequest, ListTodosRequest, MarkAsDoneRequest, Request,
};
use todokit_runtime::error::INTERNAL_ERROR_MESSAGE;
use todokit_runtime::metrics as todo_metrics;
use todokit_runtime::{EndpointError, Endpoints, ErrorHandler, InMemoryEventBus, LogErrorHandler};
use todokit_testing::{ConstantIdGenerator, FailingEvents, LogCapture, TestService};
use tracing::Level;

fn create(text: &str) -> Request<CreateTodoRequest> {
    Request::new(CreateTodoRequest {
        text: text.to_string(),
    })
}

fn mark(id: &str) -> Request<MarkAsDoneRequest> {
    Request::new(MarkAsDoneRequest { id: id.to_string() })
}

#[tokio::test]
async fn create_then_list() {
    let service = TestService::builder()
        .id_generator(ConstantIdGenerator::new("id"))
        .build();

    let created = service.endpoints.create_todo(create("My first todo")).await.unwrap();
    let listed = service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap();

    assert_eq!(created.id, "id");
    assert_eq!(listed.todos, vec![Todo::new("id", "My first todo")]);
}

#[tokio::test]
async fn list_on_empty_store_is_empty() {
    let service = TestService::builder().build();

    let listed = service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap();

    assert!(listed.todos.is_empty());
}

#[tokio::test]
async fn mark_as_done_publishes_one_event() {
    let service = TestService::builder().with_todo("id", "Do me").build();

    service.endpoints.mark_as_done(mark("id")).await.unwrap();

    assert!(service.store.get("id").await.unwrap().done);
    assert_eq!(
        service.events.events(),
        vec![MarkedAsDone { id: "id".to_string() }]
    );
}

#[tokio::test]
async fn unknown_id_is_a_not_found_business_error() {
    let service = TestService::builder().build();

    let err = service.endpoints.mark_as_done(mark("missing")).await.unwrap_err();

    assert_eq!(err.kind(), Some(BusinessKind::NotFound));
    assert_eq!(
        err.client_message(),
        "failed to mark todo as done: todo not found"
    );
    assert!(matches!(
        &err,
        EndpointError::Business { details, .. } if details == &vec![("todo_id", "missing".to_string())]
    ));
    assert!(service.events.events().is_empty());
}

#[tokio::test]
async fn blank_text_is_rejected_before_the_domain() {
    let service = TestService::builder().build();

    let err = service.endpoints.create_todo(create("  ")).await.unwrap_err();

    assert_eq!(err.kind(), Some(BusinessKind::InvalidArgument));
    assert_eq!(err.client_message(), "invalid text: must not be empty");
    assert_eq!(service.store.len().await, 0);
}

#[tokio::test]
async fn read_only_store_yields_an_internal_error() {
    let service = TestService::builder().read_only().build();

    let err = service.endpoints.create_todo(create("text")).await.unwrap_err();

    assert!(!err.is_business());
    assert_eq!(err.client_message(), INTERNAL_ERROR_MESSAGE);
    assert_eq!(err.to_string(), "store is read-only");
}

#[tokio::test]
async fn failing_store_list_is_internal() {
    let service = TestService::builder().failing_store().build();

    let err = service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap_err();

    assert!(matches!(err, EndpointError::Internal(_)));
}

#[tokio::test]
async fn log_level_follows_classification() {
    let capture = LogCapture::new();
    let _guard = capture.set_default();
    let service = TestService::builder().read_only().with_todo("id", "Do me").build();

    service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap();
    service.endpoints.mark_as_done(mark("missing")).await.unwrap_err();
    service.endpoints.create_todo(create("text")).await.unwrap_err();

    let ok = capture.find("Endpoint call succeeded").unwrap();
    assert_eq!(ok.level, Level::INFO);
    assert_eq!(ok.field("operation"), Some("list_todos"));
    assert_eq!(ok.field("outcome"), Some("success"));
    assert!(ok.field("duration_ms").is_some());

    let rejected = capture.find("Endpoint call rejected").unwrap();
    assert_eq!(rejected.level, Level::WARN);
    assert_eq!(rejected.field("operation"), Some("mark_as_done"));
    assert_eq!(rejected.field("kind"), Some("not_found"));

    let failed = capture.find("Endpoint call failed").unwrap();
    assert_eq!(failed.level, Level::ERROR);
    assert_eq!(failed.field("operation"), Some("create_todo"));
    assert_eq!(failed.field("error"), Some("store is read-only"));
}

#[tokio::test]
async fn inbound_correlation_id_reaches_logs() {
    let capture = LogCapture::new();
    let _guard = capture.set_default();
    let service = TestService::builder().build();

    service
        .endpoints
        .list_todos(Request::new(ListTodosRequest).with_correlation_id("corr-1"))
        .await
        .unwrap();

    let event = capture.find("Endpoint call succeeded").unwrap();
    assert_eq!(event.field("correlation_id"), Some("corr-1"));
}

#[tokio::test]
async fn missing_correlation_id_is_generated() {
    let capture = LogCapture::new();
    let _guard = capture.set_default();
    let service = TestService::builder().build();

    service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap();
    service
        .endpoints
        .list_todos(Request::new(ListTodosRequest))
        .await
        .unwrap();

    let ids: Vec<String> = capture
        .with_message("Endpoint call succeeded")
        .iter()
        .map(|event| event.field("correlation_id").unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| uuid::Uuid::parse_str(id).is_ok()));
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn correlation_id_is_attached_to_published_events() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut stream = bus.subscribe(&["todo"]).await.unwrap();
    let todos = TodoList::new(
        Arc::new(ConstantIdGenerator::new("id")),
        Arc::new(InMemoryStore::with_todos([Todo::new("id", "Do me")])),
        Arc::new(EventDispatcher::new(bus.clone())),
    );
    let endpoints = Endpoints::new(Arc::new(todos));

    endpoints
        .mark_as_done(mark("id").with_correlation_id("corr-42"))
        .await
        .unwrap();

    let event = stream.next().await.unwrap().unwrap();
    assert_eq!(event.decode::<MarkedAsDone>().unwrap().id, "id");
    assert_eq!(event.metadata_str("correlation_id"), Some("corr-42"));
}

#[test]
fn calls_are_counted_per_operation_and_outcome() {
    let recorder = todo_metrics::build_recorder().unwrap();
    let handle = recorder.handle();
    let service = TestService::builder().build();

    metrics::with_local_recorder(&recorder, || {
        tokio_test::block_on(async {
            service.endpoints.create_todo(create("text")).await.unwrap();
            service.endpoints.mark_as_done(mark("missing")).await.unwrap_err();
        });
    });

    let rendered = handle.render();
    let counters: Vec<&str> = rendered
        .lines()
        .filter(|line| line.starts_with(todo_metrics::ENDPOINT_REQUESTS_TOTAL))
        .collect();
    assert!(counters.iter().any(|line| line.contains("operation=\"create_todo\"")
        && line.contains("outcome=\"success\"")
        && line.ends_with(" 1")));
    assert!(counters.iter().any(|line| line.contains("operation=\"mark_as_done\"")
        && line.contains("outcome=\"business_error\"")
        && line.ends_with(" 1")));
    assert!(rendered.contains(todo_metrics::ENDPOINT_REQUEST_DURATION_SECONDS));
}

#[tokio::test]
async fn log_error_handler_warns_for_business_errors() {
    let service = TestService::builder()
        .with_todo("id", "Do me")
        .events(FailingEvents)
        .build();
    let business = service.endpoints.mark_as_done(mark("missing")).await.unwrap_err();
    let internal = service.endpoints.mark_as_done(mark("id")).await.unwrap_err();

    let capture = LogCapture::new();
    let _guard = capture.set_default();
    LogErrorHandler.handle(&business);
    LogErrorHandler.handle(&internal);

    let levels: Vec<Level> = capture
        .with_message("Request failed")
        .iter()
        .map(|event| event.level)
        .collect();
    assert_eq!(levels, vec![Level::WARN, Level::ERROR]);
}
