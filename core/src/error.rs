//! Error types for the todo domain.
//!
//! Errors are split by the collaborator that produced them ([`StoreError`],
//! [`IdGenerationError`], [`EventsError`]) and folded into [`TodoError`] by the
//! domain service. [`TodoError`] keeps the full cause chain so callers can ask
//! for the classification through [`Classify`] instead of matching on
//! concrete collaborator types.

use crate::event::EventError;
use crate::event_bus::EventBusError;
use thiserror::Error;

/// Context attached to every failure of
/// [`TodoList::mark_as_done`](crate::todo::TodoList::mark_as_done).
pub const MARK_AS_DONE_CONTEXT: &str = "failed to mark todo as done";

/// The referenced todo does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("todo not found")]
pub struct NotFoundError {
    /// ID that was looked up.
    pub id: String,
}

impl NotFoundError {
    /// Create a not-found error for `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A request that breaks an input rule before reaching the domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// Errors returned by [`Store`](crate::store::Store) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No todo with the requested ID.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The store rejects writes.
    #[error("store is read-only")]
    ReadOnly,

    /// The backing storage failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure to produce a new identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to generate id: {0}")]
pub struct IdGenerationError(pub String);

/// Errors returned by [`Events`](crate::events::Events) implementations.
#[derive(Error, Debug, Clone)]
pub enum EventsError {
    /// The event could not be encoded.
    #[error(transparent)]
    Serialization(#[from] EventError),

    /// The bus refused or lost the event.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}

/// Errors returned by the domain service.
#[derive(Error, Debug)]
pub enum TodoError {
    /// The request was rejected by an input rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ID generator failed.
    #[error(transparent)]
    IdGeneration(#[from] IdGenerationError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Publishing a domain event failed.
    #[error(transparent)]
    Events(#[from] EventsError),

    /// Another error with a stable contextual message in front of it.
    #[error("{context}: {source}")]
    WithContext {
        /// Message describing the failed operation.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: Box<TodoError>,
    },
}

impl TodoError {
    /// Wrap this error with a contextual message, keeping it as the cause.
    #[must_use]
    pub fn context(self, context: &'static str) -> Self {
        Self::WithContext {
            context,
            source: Box::new(self),
        }
    }

    /// The [`NotFoundError`] somewhere in the cause chain, if any.
    #[must_use]
    pub fn not_found(&self) -> Option<&NotFoundError> {
        match self {
            Self::Store(StoreError::NotFound(err)) => Some(err),
            Self::WithContext { source, .. } => source.not_found(),
            _ => None,
        }
    }

    /// The [`ValidationError`] somewhere in the cause chain, if any.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::WithContext { source, .. } => source.validation(),
            _ => None,
        }
    }

    /// The innermost error, with all context layers removed.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Kinds of expected, client-facing failures.
///
/// Anything that does not map to a kind is an internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessKind {
    /// The referenced resource does not exist.
    NotFound,
    /// The request itself is malformed.
    InvalidArgument,
}

impl BusinessKind {
    /// Stable snake-case name, used as a metric and log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

/// Classification of an error as business (expected) or internal.
pub trait Classify {
    /// `Some` for business errors, `None` for internal ones.
    fn business_kind(&self) -> Option<BusinessKind>;

    /// Key/value pairs describing the failure, safe to log.
    fn details(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl Classify for TodoError {
    fn business_kind(&self) -> Option<BusinessKind> {
        if self.not_found().is_some() {
            Some(BusinessKind::NotFound)
        } else if self.validation().is_some() {
            Some(BusinessKind::InvalidArgument)
        } else {
            None
        }
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        match (self.not_found(), self.validation()) {
            (Some(err), _) => vec![("todo_id", err.id.clone())],
            (None, Some(err)) => vec![("field", err.field.to_string())],
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_survives_context_wrapping() {
        let err = TodoError::from(StoreError::from(NotFoundError::new("missing")))
            .context(MARK_AS_DONE_CONTEXT);

        assert_eq!(err.to_string(), "failed to mark todo as done: todo not found");
        assert_eq!(err.not_found(), Some(&NotFoundError::new("missing")));
        assert_eq!(err.business_kind(), Some(BusinessKind::NotFound));
        assert_eq!(err.details(), vec![("todo_id", "missing".to_string())]);
    }

    #[test]
    fn context_keeps_original_error_as_source() {
        let err = TodoError::from(StoreError::ReadOnly).context(MARK_AS_DONE_CONTEXT);

        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("store is read-only"));
        assert!(matches!(err.root_cause(), TodoError::Store(StoreError::ReadOnly)));
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let errors = [
            TodoError::from(StoreError::ReadOnly),
            TodoError::from(StoreError::Unavailable("disk on fire".to_string())),
            TodoError::from(IdGenerationError("entropy exhausted".to_string())),
            TodoError::from(EventsError::Bus(EventBusError::Other("down".to_string()))),
        ];

        for err in errors {
            assert_eq!(err.business_kind(), None, "{err}");
            assert!(err.details().is_empty());
        }
    }

    #[test]
    fn validation_is_a_business_error() {
        let err = TodoError::from(ValidationError {
            field: "text",
            reason: "must not be empty",
        });

        assert_eq!(err.to_string(), "invalid text: must not be empty");
        assert_eq!(err.business_kind(), Some(BusinessKind::InvalidArgument));
    }
}
