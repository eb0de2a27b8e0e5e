//! The todo list domain service.

use crate::error::{MARK_AS_DONE_CONTEXT, TodoError};
use crate::events::{Events, MarkedAsDone};
use crate::idgen::IdGenerator;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A todo item.
///
/// Created with `done == false`; only [`TodoList::mark_as_done`] changes it,
/// and only towards `true`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier.
    pub id: String,
    /// What needs doing.
    pub text: String,
    /// Whether it has been done.
    pub done: bool,
}

impl Todo {
    /// A new, not yet done todo.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            done: false,
        }
    }
}

/// Manages a list of todos.
///
/// Input rules (non-empty text) are enforced by the caller; the service
/// trusts what it is given.
#[derive(Clone)]
pub struct TodoList {
    id_generator: Arc<dyn IdGenerator>,
    store: Arc<dyn Store>,
    events: Arc<dyn Events>,
}

impl TodoList {
    /// Create a service from its collaborators.
    #[must_use]
    pub fn new(
        id_generator: Arc<dyn IdGenerator>,
        store: Arc<dyn Store>,
        events: Arc<dyn Events>,
    ) -> Self {
        Self {
            id_generator,
            store,
            events,
        }
    }

    /// Add a new todo and return its ID.
    ///
    /// The store is not touched if ID generation fails.
    ///
    /// # Errors
    ///
    /// Returns the ID generator's or the store's error.
    pub async fn create_todo(&self, text: impl Into<String>) -> Result<String, TodoError> {
        let id = self.id_generator.generate()?;
        let todo = Todo::new(id.clone(), text);

        self.store.store(&todo).await?;

        Ok(id)
    }

    /// All todos, including done ones.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.all().await?)
    }

    /// Mark a todo as done and publish [`MarkedAsDone`].
    ///
    /// Not idempotent: marking a done todo again stores it again and
    /// publishes another event. The store write and the publish are not
    /// atomic; if publishing fails the todo stays done and the call still
    /// fails.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped with [`MARK_AS_DONE_CONTEXT`]. An unknown
    /// ID fails with a [`NotFoundError`](crate::error::NotFoundError) cause.
    pub async fn mark_as_done(&self, id: &str) -> Result<(), TodoError> {
        let wrap = |err: TodoError| err.context(MARK_AS_DONE_CONTEXT);

        let mut todo = self
            .store
            .get(id)
            .await
            .map_err(|e| wrap(e.into()))?;

        todo.done = true;

        self.store
            .store(&todo)
            .await
            .map_err(|e| wrap(e.into()))?;

        self.events
            .marked_as_done(MarkedAsDone { id: todo.id })
            .await
            .map_err(|e| wrap(e.into()))?;

        Ok(())
    }
}

impl std::fmt::Debug for TodoList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoList").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::{
        BusinessKind, Classify, EventsError, IdGenerationError, NotFoundError, StoreError,
    };
    use crate::event_bus::EventBusError;
    use crate::store::{InMemoryStore, ReadOnlyStore};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedId(&'static str);

    impl IdGenerator for FixedId {
        fn generate(&self) -> Result<String, IdGenerationError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct Sequence(AtomicUsize);

    impl IdGenerator for Sequence {
        fn generate(&self) -> Result<String, IdGenerationError> {
            Ok(format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    struct BrokenIds;

    impl IdGenerator for BrokenIds {
        fn generate(&self) -> Result<String, IdGenerationError> {
            Err(IdGenerationError("entropy exhausted".to_string()))
        }
    }

    #[derive(Default)]
    struct Recorded {
        events: Mutex<Vec<MarkedAsDone>>,
        fail: bool,
    }

    #[async_trait]
    impl Events for Recorded {
        async fn marked_as_done(&self, event: MarkedAsDone) -> Result<(), EventsError> {
            if self.fail {
                return Err(EventsError::Bus(EventBusError::Other("down".to_string())));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn service(
        ids: impl IdGenerator + 'static,
        store: Arc<dyn Store>,
    ) -> (TodoList, Arc<Recorded>) {
        let events = Arc::new(Recorded::default());
        (TodoList::new(Arc::new(ids), store, events.clone()), events)
    }

    #[tokio::test]
    async fn create_todo_then_list() {
        let (todos, _) = service(FixedId("id"), Arc::new(InMemoryStore::new()));

        let id = todos.create_todo("My first todo").await.unwrap();

        assert_eq!(id, "id");
        assert_eq!(
            todos.list_todos().await.unwrap(),
            vec![Todo::new("id", "My first todo")]
        );
    }

    #[tokio::test]
    async fn create_todo_fails_on_read_only_store() {
        let store = Arc::new(ReadOnlyStore::new(InMemoryStore::new()));
        let (todos, _) = service(FixedId("id"), store);

        let err = todos.create_todo("My first todo").await.unwrap_err();

        assert!(matches!(err, TodoError::Store(StoreError::ReadOnly)));
        assert_eq!(err.business_kind(), None);
    }

    #[tokio::test]
    async fn create_todo_does_not_store_when_id_generation_fails() {
        let store = Arc::new(InMemoryStore::new());
        let (todos, _) = service(BrokenIds, store.clone());

        let err = todos.create_todo("text").await.unwrap_err();

        assert!(matches!(err, TodoError::IdGeneration(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn list_todos_on_empty_store_is_empty() {
        let (todos, _) = service(Sequence::default(), Arc::new(InMemoryStore::new()));

        assert!(todos.list_todos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_as_done_stores_and_publishes_once() {
        let store = Arc::new(InMemoryStore::with_todos([Todo::new("id", "Do me")]));
        let (todos, events) = service(Sequence::default(), store.clone());

        todos.mark_as_done("id").await.unwrap();

        let stored = store.get("id").await.unwrap();
        assert_eq!(
            stored,
            Todo {
                id: "id".to_string(),
                text: "Do me".to_string(),
                done: true,
            }
        );
        assert_eq!(
            *events.events.lock().unwrap(),
            vec![MarkedAsDone { id: "id".to_string() }]
        );
    }

    #[tokio::test]
    async fn mark_as_done_twice_publishes_twice() {
        let store = Arc::new(InMemoryStore::with_todos([Todo::new("id", "Do me")]));
        let (todos, events) = service(Sequence::default(), store);

        todos.mark_as_done("id").await.unwrap();
        todos.mark_as_done("id").await.unwrap();

        assert_eq!(events.events.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn mark_as_done_unknown_id_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let (todos, events) = service(Sequence::default(), store.clone());

        let err = todos.mark_as_done("missing").await.unwrap_err();

        assert_eq!(err.not_found(), Some(&NotFoundError::new("missing")));
        assert_eq!(err.business_kind(), Some(BusinessKind::NotFound));
        assert_eq!(err.to_string(), "failed to mark todo as done: todo not found");
        assert!(store.is_empty().await);
        assert!(events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_as_done_publish_failure_leaves_todo_done() {
        let store = Arc::new(InMemoryStore::with_todos([Todo::new("id", "Do me")]));
        let events = Arc::new(Recorded {
            fail: true,
            ..Recorded::default()
        });
        let todos = TodoList::new(Arc::new(Sequence::default()), store.clone(), events);

        let err = todos.mark_as_done("id").await.unwrap_err();

        assert!(matches!(err.root_cause(), TodoError::Events(_)));
        assert!(err.to_string().starts_with("failed to mark todo as done: "));
        assert_eq!(err.business_kind(), None);
        assert!(store.get("id").await.unwrap().done);
    }

    #[tokio::test]
    async fn mark_as_done_on_read_only_store_is_wrapped_internal_error() {
        let inner = InMemoryStore::with_todos([Todo::new("id", "Do me")]);
        let store = Arc::new(ReadOnlyStore::new(inner));
        let (todos, events) = service(Sequence::default(), store);

        let err = todos.mark_as_done("id").await.unwrap_err();

        assert!(matches!(
            err.root_cause(),
            TodoError::Store(StoreError::ReadOnly)
        ));
        assert_eq!(err.business_kind(), None);
        assert!(events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_creates_never_collide() {
        let store = Arc::new(InMemoryStore::new());
        let (todos, _) = service(Sequence::default(), store.clone());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let todos = todos.clone();
                tokio::spawn(async move { todos.create_todo(format!("todo {i}")).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 50);
        assert_eq!(store.len().await, 50);
    }

    proptest! {
        #[test]
        fn created_todos_are_listed_not_done(text in "[a-zA-Z0-9 ]{1,40}") {
            let (todos, _) = service(Sequence::default(), Arc::new(InMemoryStore::new()));

            let (id, listed) = tokio_test::block_on(async {
                let id = todos.create_todo(text.clone()).await.unwrap();
                (id, todos.list_todos().await.unwrap())
            });

            prop_assert_eq!(listed, vec![Todo { id, text, done: false }]);
        }
    }
}
