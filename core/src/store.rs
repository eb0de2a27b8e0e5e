//! Todo persistence contract and reference implementations.

use crate::error::{NotFoundError, StoreError};
use crate::todo::Todo;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persists and retrieves todos.
///
/// Implementations are shared between concurrent requests and must be
/// internally synchronized.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace a todo, keyed by its ID.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write cannot be performed.
    async fn store(&self, todo: &Todo) -> Result<(), StoreError>;

    /// All todos, in a stable order for a given store state.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the read cannot be performed.
    async fn all(&self) -> Result<Vec<Todo>, StoreError>;

    /// The todo with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown IDs.
    async fn get(&self, id: &str) -> Result<Todo, StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn store(&self, todo: &Todo) -> Result<(), StoreError> {
        (**self).store(todo).await
    }

    async fn all(&self) -> Result<Vec<Todo>, StoreError> {
        (**self).all().await
    }

    async fn get(&self, id: &str) -> Result<Todo, StoreError> {
        (**self).get(id).await
    }
}

#[derive(Debug, Default)]
struct Todos {
    items: Vec<Todo>,
    index: HashMap<String, usize>,
}

impl Todos {
    fn upsert(&mut self, todo: Todo) {
        if let Some(&slot) = self.index.get(&todo.id) {
            self.items[slot] = todo;
        } else {
            self.index.insert(todo.id.clone(), self.items.len());
            self.items.push(todo);
        }
    }
}

/// In-memory [`Store`] guarded by a single mutex.
///
/// `all` enumerates todos in insertion order. Replacing a todo keeps its
/// original position.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    todos: Mutex<Todos>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `todos`, in iteration order.
    #[must_use]
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let mut inner = Todos::default();
        for todo in todos {
            inner.upsert(todo);
        }
        Self {
            todos: Mutex::new(inner),
        }
    }

    /// Number of stored todos.
    pub async fn len(&self) -> usize {
        self.todos.lock().await.items.len()
    }

    /// Whether the store holds no todos.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn store(&self, todo: &Todo) -> Result<(), StoreError> {
        self.todos.lock().await.upsert(todo.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.todos.lock().await.items.clone())
    }

    async fn get(&self, id: &str) -> Result<Todo, StoreError> {
        let todos = self.todos.lock().await;
        todos
            .index
            .get(id)
            .map(|&slot| todos.items[slot].clone())
            .ok_or_else(|| NotFoundError::new(id).into())
    }
}

/// A [`Store`] wrapper that serves reads and rejects every write.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore<S> {
    inner: S,
}

impl<S: Store> ReadOnlyStore<S> {
    /// Wrap `inner`.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: Store> Store for ReadOnlyStore<S> {
    async fn store(&self, _todo: &Todo) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    async fn all(&self) -> Result<Vec<Todo>, StoreError> {
        self.inner.all().await
    }

    async fn get(&self, id: &str) -> Result<Todo, StoreError> {
        self.inner.get(id).await
    }
}
