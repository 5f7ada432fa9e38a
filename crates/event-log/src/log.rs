use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventData, Position, RecordedEvent, Result};

/// A stream of recorded events, delivered in stream order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RecordedEvent>> + Send>>;

/// Core trait for event log implementations.
///
/// The log is append-only: records are never mutated or deleted. Delivery
/// on subscription is at-least-once, so consumers must tolerate redelivery.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends a batch of events to a stream, regardless of the stream's
    /// current state (no optimistic-concurrency precondition).
    ///
    /// The batch commits atomically and its internal order is preserved.
    /// Batches from concurrent producers may interleave; the log serializes
    /// them into one total order per stream.
    ///
    /// Returns the position assigned to the last event in the batch.
    /// Fails with [`EventLogError::EmptyAppend`](crate::EventLogError::EmptyAppend)
    /// for an empty batch.
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<Position>;

    /// Reads recorded events strictly after `from` (start-of-stream if
    /// `None`), in position order.
    async fn read_from(
        &self,
        stream: &str,
        from: Option<Position>,
    ) -> Result<Vec<RecordedEvent>>;

    /// Opens a long-lived subscription delivering records in stream order,
    /// starting strictly after `from` (start-of-stream if `None`).
    ///
    /// The stream may end or yield an error when the underlying delivery
    /// channel drops or lags; resubscribing from a checkpoint is the
    /// consumer's responsibility.
    async fn subscribe(&self, stream: &str, from: Option<Position>) -> Result<EventStream>;
}
