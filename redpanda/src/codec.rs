//! Kafka message layout for [`SerializedEvent`].
//!
//! The message value is the event's JSON payload, untouched, so any Kafka
//! consumer reads `{"ID":"..."}` directly. The event type and metadata ride
//! along as headers:
//!
//! | header       | value                          |
//! |--------------|--------------------------------|
//! | `event_type` | UTF-8 event type               |
//! | `metadata`   | JSON object, only when present |
//!
//! The message key is the event type.

use rdkafka::message::{Header, Headers, OwnedHeaders};
use todokit_core::event::SerializedEvent;
use todokit_core::event_bus::EventBusError;

/// Header carrying the event type.
pub const EVENT_TYPE_HEADER: &str = "event_type";

/// Header carrying the JSON metadata object.
pub const METADATA_HEADER: &str = "metadata";

/// Build the headers for `event`.
///
/// # Errors
///
/// Returns [`EventBusError::Other`] if the metadata cannot be serialized.
pub fn encode_headers(event: &SerializedEvent) -> Result<OwnedHeaders, EventBusError> {
    let headers = OwnedHeaders::new_with_capacity(2).insert(Header {
        key: EVENT_TYPE_HEADER,
        value: Some(event.event_type.as_str()),
    });

    let Some(metadata) = &event.metadata else {
        return Ok(headers);
    };

    let metadata = serde_json::to_vec(metadata)
        .map_err(|e| EventBusError::Other(format!("Failed to serialize metadata: {e}")))?;

    Ok(headers.insert(Header {
        key: METADATA_HEADER,
        value: Some(metadata.as_slice()),
    }))
}

/// Rebuild an event from a message's payload and headers.
///
/// # Errors
///
/// Returns [`EventBusError::DeserializationFailed`] if the payload or the
/// `event_type` header is missing, or the metadata header is not JSON.
pub fn decode_event<H: Headers>(
    payload: Option<&[u8]>,
    headers: Option<&H>,
) -> Result<SerializedEvent, EventBusError> {
    let payload = payload.ok_or_else(|| {
        EventBusError::DeserializationFailed("Message has no payload".to_string())
    })?;

    let mut event_type = None;
    let mut metadata = None;

    if let Some(headers) = headers {
        for header in (0..headers.count()).filter_map(|idx| headers.try_get(idx)) {
            match header.key {
                EVENT_TYPE_HEADER => {
                    let value = header.value.unwrap_or_default();
                    let value = std::str::from_utf8(value).map_err(|e| {
                        EventBusError::DeserializationFailed(format!(
                            "Event type header is not UTF-8: {e}"
                        ))
                    })?;
                    event_type = Some(value.to_string());
                },
                METADATA_HEADER => {
                    let value = header.value.unwrap_or_default();
                    let value = serde_json::from_slice(value).map_err(|e| {
                        EventBusError::DeserializationFailed(format!(
                            "Metadata header is not JSON: {e}"
                        ))
                    })?;
                    metadata = Some(value);
                },
                _ => {},
            }
        }
    }

    let event_type = event_type.ok_or_else(|| {
        EventBusError::DeserializationFailed("Message has no event_type header".to_string())
    })?;

    Ok(SerializedEvent::new(event_type, payload.to_vec(), metadata))
}
