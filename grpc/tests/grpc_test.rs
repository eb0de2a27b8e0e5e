//! gRPC transport: handlers, status mapping, finalizer reporting, wire calls.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use todokit_core::events::MarkedAsDone;
use todokit_core::store::Store;
use todokit_grpc::proto::{
    CreateTodoRequest, ListTodosRequest, MarkAsDoneRequest, MarkAsDoneResponse, Todo,
};
use todokit_grpc::{CORRELATION_ID_METADATA, TodoListClient, TodoListServer, TodoListService};
use todokit_testing::{
    ConstantIdGenerator, FailingEvents, FailingIdGenerator, LogCapture, TestService,
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Code, Request};

fn service(test: &TestService) -> TodoListService {
    TodoListService::new(test.endpoints.clone(), test.errors.clone())
}

async fn serve(test: &TestService) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = TodoListServer::new(service(test));

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(server)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    addr
}

#[tokio::test]
async fn create_then_list() {
    let test = TestService::builder()
        .id_generator(ConstantIdGenerator::new("id"))
        .build();
    let service = service(&test);

    let created = service
        .create_todo(Request::new(CreateTodoRequest {
            text: "My first todo".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(created.get_ref().id, "id");

    let listed = service
        .list_todos(Request::new(ListTodosRequest {}))
        .await
        .unwrap();
    assert_eq!(
        listed.into_inner().todos,
        vec![Todo {
            id: "id".to_string(),
            text: "My first todo".to_string(),
            done: false,
        }]
    );
}

#[tokio::test]
async fn empty_list_is_not_an_error() {
    let test = TestService::builder().build();

    let listed = service(&test)
        .list_todos(Request::new(ListTodosRequest {}))
        .await
        .unwrap();

    assert!(listed.into_inner().todos.is_empty());
}

#[tokio::test]
async fn mark_as_done_publishes_the_event() {
    let test = TestService::builder().with_todo("id", "Do me").build();

    let response = service(&test)
        .mark_as_done(Request::new(MarkAsDoneRequest {
            id: "id".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(response.into_inner(), MarkAsDoneResponse {});
    assert!(test.store.get("id").await.unwrap().done);
    assert_eq!(
        test.events.events(),
        vec![MarkedAsDone { id: "id".to_string() }]
    );
}

#[tokio::test]
async fn not_found_maps_to_not_found_and_is_reported_once() {
    let test = TestService::builder().build();

    let status = service(&test)
        .mark_as_done(Request::new(MarkAsDoneRequest {
            id: "missing".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), "failed to mark todo as done: todo not found");
    assert_eq!(test.errors.len(), 1);
}

#[tokio::test]
async fn blank_text_is_an_invalid_argument() {
    let test = TestService::builder().build();

    let status = service(&test)
        .create_todo(Request::new(CreateTodoRequest {
            text: String::new(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn internal_errors_are_opaque() {
    let test = TestService::builder().read_only().build();

    let status = service(&test)
        .create_todo(Request::new(CreateTodoRequest {
            text: "text".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), "internal server error");

    let errors = test.errors.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "store is read-only");
}

#[tokio::test]
async fn publish_failure_is_internal_and_the_todo_stays_done() {
    let test = TestService::builder()
        .with_todo("id", "Do me")
        .events(FailingEvents)
        .build();

    let status = service(&test)
        .mark_as_done(Request::new(MarkAsDoneRequest {
            id: "id".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), "internal server error");
    assert_eq!(test.errors.len(), 1);
    assert!(!test.errors.errors()[0].is_business());
    assert!(test.store.get("id").await.unwrap().done);
}

#[tokio::test]
async fn id_generation_failure_is_internal() {
    let test = TestService::builder()
        .id_generator(FailingIdGenerator)
        .build();

    let status = service(&test)
        .create_todo(Request::new(CreateTodoRequest {
            text: "text".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert_eq!(test.errors.len(), 1);
    assert!(!test.errors.errors()[0].is_business());
}

#[tokio::test]
async fn correlation_id_is_read_from_metadata() {
    let capture = LogCapture::new();
    let _guard = capture.set_default();
    let test = TestService::builder().build();

    let mut request = Request::new(ListTodosRequest {});
    request
        .metadata_mut()
        .insert(CORRELATION_ID_METADATA, "corr-9".parse().unwrap());
    service(&test).list_todos(request).await.unwrap();

    let event = capture.find("Endpoint call succeeded").unwrap();
    assert_eq!(event.field("correlation_id"), Some("corr-9"));
}

#[tokio::test]
async fn calls_over_the_wire() {
    let test = TestService::builder()
        .id_generator(ConstantIdGenerator::new("id"))
        .build();
    let addr = serve(&test).await;
    let mut client = TodoListClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    let created = client
        .create_todo(CreateTodoRequest {
            text: "Over the wire".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.into_inner().id, "id");

    client
        .mark_as_done(MarkAsDoneRequest {
            id: "id".to_string(),
        })
        .await
        .unwrap();

    let listed = client.list_todos(ListTodosRequest {}).await.unwrap();
    assert_eq!(
        listed.into_inner().todos,
        vec![Todo {
            id: "id".to_string(),
            text: "Over the wire".to_string(),
            done: true,
        }]
    );

    let status = client
        .mark_as_done(MarkAsDoneRequest {
            id: "missing".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(test.errors.len(), 1);
}
