use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a record within the log's total order for a stream.
///
/// Positions start at 1 and only ever grow. Consumers persist the last
/// position they handled and resume strictly after it; beyond ordering
/// and checkpointing the value is opaque.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(u64);

impl Position {
    /// Creates a position from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw position value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Position> for u64 {
    fn from(position: Position) -> Self {
        position.0
    }
}

/// An event as submitted by a producer: a self-describing payload tagged
/// with its type name.
///
/// The tag is the sole dispatch key on the consumer side and must stay
/// stable across every producer and consumer version sharing a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    /// Unique identifier for this record.
    pub event_id: EventId,

    /// The event type tag (e.g. "ProductCreated").
    pub event_type: String,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl EventData {
    /// Creates event data from a raw JSON payload.
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// Creates event data by serializing any payload type.
    pub fn encode<T: Serialize>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }
}

/// An event as delivered to a subscriber: the submitted data plus the
/// stream it belongs to, its assigned position, and the append time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Unique identifier for this record.
    pub event_id: EventId,

    /// The stream this record belongs to.
    pub stream: String,

    /// The record's position in the stream's total order.
    pub position: Position,

    /// The event type tag.
    pub event_type: String,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_new_creates_unique_ids() {
        let id1 = EventId::new();
        let id2 = EventId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn position_ordering() {
        assert!(Position::new(1) < Position::new(2));
        assert_eq!(Position::new(3).as_u64(), 3);
    }

    #[test]
    fn event_data_encode_serializes_payload() {
        #[derive(Serialize)]
        struct Payload {
            value: u32,
        }

        let data = EventData::encode("TestEvent", &Payload { value: 7 }).unwrap();
        assert_eq!(data.event_type, "TestEvent");
        assert_eq!(data.payload, serde_json::json!({"value": 7}));
    }
}
