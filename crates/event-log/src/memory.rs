use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use tokio::sync::{RwLock, broadcast};

use crate::{
    EventData, EventLogError, Position, RecordedEvent, Result,
    log::{EventLog, EventStream},
};

struct Inner {
    events: Vec<RecordedEvent>,
    next_position: u64,
}

/// In-memory event log implementation for testing.
///
/// Appended records are kept in a vector and additionally fanned out over
/// a bounded broadcast channel so subscriptions tail the stream live. The
/// backlog snapshot and the live receiver are taken under one lock, so a
/// subscription never misses a record between replay and live delivery.
#[derive(Clone)]
pub struct InMemoryEventLog {
    inner: Arc<RwLock<Inner>>,
    tx: broadcast::Sender<RecordedEvent>,
}

impl InMemoryEventLog {
    /// Creates a new empty in-memory event log.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Creates a log with a bounded live-delivery buffer.
    ///
    /// A small capacity makes subscription lag (and the resulting
    /// [`EventLogError::SubscriptionLagged`]) reproducible in tests.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                events: Vec::new(),
                next_position: 1,
            })),
            tx,
        }
    }

    /// Returns the total number of records stored.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<Position> {
        if events.is_empty() {
            return Err(EventLogError::EmptyAppend);
        }

        let mut inner = self.inner.write().await;

        let mut last_position = Position::new(0);
        let mut recorded = Vec::with_capacity(events.len());
        for event in events {
            let position = Position::new(inner.next_position);
            inner.next_position += 1;
            last_position = position;

            recorded.push(RecordedEvent {
                event_id: event.event_id,
                stream: stream.to_string(),
                position,
                event_type: event.event_type,
                payload: event.payload,
                recorded_at: Utc::now(),
            });
        }

        for event in recorded {
            inner.events.push(event.clone());
            // No receivers is fine; backlog replay covers late subscribers.
            let _ = self.tx.send(event);
        }

        metrics::counter!("event_log_records_appended").increment(1);
        Ok(last_position)
    }

    async fn read_from(
        &self,
        stream: &str,
        from: Option<Position>,
    ) -> Result<Vec<RecordedEvent>> {
        let inner = self.inner.read().await;
        let events = inner
            .events
            .iter()
            .filter(|e| e.stream == stream && from.is_none_or(|p| e.position > p))
            .cloned()
            .collect();
        Ok(events)
    }

    async fn subscribe(&self, stream: &str, from: Option<Position>) -> Result<EventStream> {
        // Hold the read lock while snapshotting the backlog and creating
        // the live receiver: append needs the write lock, so any record
        // appended after this point is only delivered via the receiver.
        let inner = self.inner.read().await;
        let rx = self.tx.subscribe();
        let backlog: Vec<RecordedEvent> = inner
            .events
            .iter()
            .filter(|e| e.stream == stream && from.is_none_or(|p| e.position > p))
            .cloned()
            .collect();
        drop(inner);

        let stream_name = stream.to_string();
        let live = stream::unfold((rx, stream_name), |(mut rx, name)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if event.stream == name {
                            return Some((Ok(event), (rx, name)));
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        return Some((
                            Err(EventLogError::SubscriptionLagged { skipped }),
                            (rx, name),
                        ));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream::iter(backlog.into_iter().map(Ok)).chain(live)))
    }
}
