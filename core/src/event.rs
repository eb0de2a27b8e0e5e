//! Event trait and the wire envelope used by event buses.
//!
//! Events represent facts about things that have happened and are immutable.
//!
//! # Design
//!
//! Event payloads are JSON so that consumers written in any language can read
//! them straight off the bus. The payload carries only the event's own fields;
//! everything else (type name, correlation) travels next to it in
//! [`SerializedEvent`].
//!
//! # Example
//!
//! ```
//! use todokit_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct TodoArchived {
//!     #[serde(rename = "ID")]
//!     id: String,
//! }
//!
//! impl Event for TodoArchived {
//!     fn event_type(&self) -> &'static str {
//!         "TodoArchived"
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// A domain event that can be published on an event bus.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable identifier that consumers route on, for
/// example `"MarkedAsDone"`. Renaming it is a breaking change for every
/// subscriber.
///
/// # Thread Safety
///
/// Events must be `Send + Sync + 'static` to be safely passed between tasks.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are not valid
    /// JSON or do not match this event's schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for publishing.
///
/// This struct contains the event type name and the serialized bytes,
/// along with optional metadata. It's the wire format between the
/// application and the event bus.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "MarkedAsDone").
    pub event_type: String,

    /// The JSON-serialized event data.
    pub data: Vec<u8>,

    /// Optional metadata as a JSON object.
    ///
    /// Common metadata fields:
    /// - `correlation_id`: Links the event to the request that caused it
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    ///
    /// # Examples
    ///
    /// ```
    /// use todokit_core::event::SerializedEvent;
    ///
    /// let event = SerializedEvent::new(
    ///     "MarkedAsDone".to_string(),
    ///     br#"{"ID":"id"}"#.to_vec(),
    ///     None,
    /// );
    /// ```
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an `Event` value.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }

    /// Decode the payload into a concrete event type.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload does not
    /// match `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }

    /// Look up a string metadata field.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct Renamed {
        #[serde(rename = "ID")]
        id: String,
    }

    impl Event for Renamed {
        fn event_type(&self) -> &'static str {
            "Renamed"
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn payload_uses_declared_field_names() {
        let event = Renamed {
            id: "x".to_string(),
        };

        let bytes = event.to_bytes().expect("serialization should succeed");
        assert_eq!(bytes, br#"{"ID":"x"}"#);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialized_event_from_event_keeps_metadata() {
        let event = Renamed {
            id: "x".to_string(),
        };
        let metadata = serde_json::json!({ "correlation_id": "corr-456" });

        let serialized = SerializedEvent::from_event(&event, Some(metadata))
            .expect("serialization should succeed");

        assert_eq!(serialized.event_type, "Renamed");
        assert_eq!(serialized.metadata_str("correlation_id"), Some("corr-456"));
        assert_eq!(serialized.metadata_str("missing"), None);
        assert_eq!(serialized.decode::<Renamed>().expect("decodes"), event);
    }

    #[test]
    fn decode_rejects_foreign_payload() {
        let serialized = SerializedEvent::new("Renamed".to_string(), b"not json".to_vec(), None);

        let err = serialized.decode::<Renamed>();
        assert!(matches!(err, Err(EventError::DeserializationError(_))));
    }

    #[test]
    fn serialized_event_display() {
        let serialized =
            SerializedEvent::new("Renamed".to_string(), vec![1, 2, 3, 4, 5], None);

        let display = format!("{serialized}");
        assert!(display.contains("Renamed"));
        assert!(display.contains("5 bytes"));
    }
}
