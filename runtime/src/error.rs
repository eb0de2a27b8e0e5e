//! Endpoint error classification and operator-facing error reporting.
//!
//! Endpoints never return domain errors directly. The client-error middleware
//! turns them into an [`EndpointError`], a tagged variant transports switch on:
//! [`EndpointError::Business`] for expected failures the caller caused, and
//! [`EndpointError::Internal`] for everything an operator needs to see.

use std::sync::Arc;
use thiserror::Error;
use todokit_core::error::{BusinessKind, Classify};

/// The only message internal failures ever show to a client.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Classified endpoint failure.
#[derive(Debug, Clone, Error)]
pub enum EndpointError {
    /// Expected failure caused by the request.
    #[error("{message}")]
    Business {
        /// What kind of business failure.
        kind: BusinessKind,
        /// Client-safe description.
        message: String,
        /// Key/value pairs describing the failure.
        details: Vec<(&'static str, String)>,
    },

    /// Unexpected failure. The cause is for logs only.
    #[error(transparent)]
    Internal(Arc<dyn std::error::Error + Send + Sync>),
}

impl EndpointError {
    /// Classify an error through its [`Classify`] implementation.
    pub fn classify<E>(err: E) -> Self
    where
        E: Classify + std::error::Error + Send + Sync + 'static,
    {
        match err.business_kind() {
            Some(kind) => Self::Business {
                kind,
                message: err.to_string(),
                details: err.details(),
            },
            None => Self::Internal(Arc::new(err)),
        }
    }

    /// An internal error wrapping `err`.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Arc::new(err))
    }

    /// The business kind, `None` for internal errors.
    #[must_use]
    pub const fn kind(&self) -> Option<BusinessKind> {
        match self {
            Self::Business { kind, .. } => Some(*kind),
            Self::Internal(_) => None,
        }
    }

    /// Whether this is an expected, client-caused failure.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }

    /// The message safe to send over the wire.
    #[must_use]
    pub fn client_message(&self) -> &str {
        match self {
            Self::Business { message, .. } => message,
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// Outcome label used by logs and metrics.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Business { .. } => "business_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Receives endpoint errors for operator-facing reporting.
///
/// Transports call this exactly once per failed request.
pub trait ErrorHandler: Send + Sync {
    /// Report `err`.
    fn handle(&self, err: &EndpointError);
}

impl<H> ErrorHandler for Arc<H>
where
    H: ErrorHandler + ?Sized,
{
    fn handle(&self, err: &EndpointError) {
        (**self).handle(err);
    }
}

/// Reports errors to the log: business errors at `warn`, internal ones at
/// `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, err: &EndpointError) {
        match err {
            EndpointError::Business { kind, details, .. } => tracing::warn!(
                error = %err,
                kind = kind.as_str(),
                details = ?details,
                "Request failed"
            ),
            EndpointError::Internal(cause) => tracing::error!(
                error = %err,
                cause = ?cause,
                "Request failed"
            ),
        }
    }
}

/// Drops business errors and forwards the rest to the wrapped handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientErrorFilter<H> {
    inner: H,
}

impl<H: ErrorHandler> ClientErrorFilter<H> {
    /// Wrap `inner`.
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: ErrorHandler> ErrorHandler for ClientErrorFilter<H> {
    fn handle(&self, err: &EndpointError) {
        if err.is_business() {
            return;
        }
        self.inner.handle(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use todokit_core::error::{MARK_AS_DONE_CONTEXT, NotFoundError, StoreError, TodoError};

    #[derive(Default)]
    struct Counting(Mutex<Vec<String>>);

    impl ErrorHandler for Counting {
        fn handle(&self, err: &EndpointError) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(err.to_string());
            }
        }
    }

    fn not_found() -> TodoError {
        TodoError::from(StoreError::from(NotFoundError::new("id"))).context(MARK_AS_DONE_CONTEXT)
    }

    #[test]
    fn not_found_classifies_as_business() {
        let err = EndpointError::classify(not_found());

        assert_eq!(err.kind(), Some(BusinessKind::NotFound));
        assert_eq!(
            err.client_message(),
            "failed to mark todo as done: todo not found"
        );
        assert_eq!(err.outcome(), "business_error");
    }

    #[test]
    fn internal_errors_hide_their_cause_from_clients() {
        let err = EndpointError::classify(TodoError::from(StoreError::Unavailable(
            "connection refused".to_string(),
        )));

        assert!(!err.is_business());
        assert_eq!(err.client_message(), INTERNAL_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }

    #[test]
    fn filter_forwards_internal_errors_only() {
        let counting = Arc::new(Counting::default());
        let filter = ClientErrorFilter::new(Arc::clone(&counting));

        filter.handle(&EndpointError::classify(not_found()));
        filter.handle(&EndpointError::classify(TodoError::from(StoreError::ReadOnly)));

        let seen = counting.0.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec!["store is read-only".to_string()]);
    }
}
