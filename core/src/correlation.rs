//! Task-local correlation identifier.
//!
//! The endpoint layer runs every request inside [`scope`]; anything deeper in
//! the call stack (the event dispatcher, for instance) reads the identifier
//! with [`current`] instead of having it threaded through every signature.

use std::future::Future;

tokio::task_local! {
    static CORRELATION_ID: String;
}

/// Run `future` with `correlation_id` as the current correlation identifier.
pub async fn scope<F>(correlation_id: String, future: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID.scope(correlation_id, future).await
}

/// The correlation identifier of the enclosing [`scope`], if any.
#[must_use]
pub fn current() -> Option<String> {
    CORRELATION_ID.try_with(Clone::clone).ok()
}
