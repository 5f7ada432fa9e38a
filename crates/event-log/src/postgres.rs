use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventData, EventId, EventLogError, Position, RecordedEvent, Result,
    log::{EventLog, EventStream},
};

/// PostgreSQL-backed event log implementation.
///
/// Records live in the `event_log` table; `position` is a `BIGSERIAL`, so
/// the database serializes concurrent appends into one total order.
/// Subscriptions poll for records past a cursor at a configurable interval.
#[derive(Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
    poll_interval: Duration,
}

impl PostgresEventLog {
    /// Creates a new PostgreSQL event log with the default 100ms poll interval.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Overrides the subscription poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<RecordedEvent> {
        Ok(RecordedEvent {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            stream: row.try_get("stream_name")?,
            position: Position::new(row.try_get::<i64, _>("position")? as u64),
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }

    async fn fetch_after(
        pool: &PgPool,
        stream: &str,
        after: u64,
        limit: i64,
    ) -> Result<Vec<RecordedEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT position, event_id, stream_name, event_type, payload, recorded_at
            FROM event_log
            WHERE stream_name = $1 AND position > $2
            ORDER BY position
            LIMIT $3
            "#,
        )
        .bind(stream)
        .bind(after as i64)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}

#[async_trait]
impl EventLog for PostgresEventLog {
    async fn append(&self, stream: &str, events: Vec<EventData>) -> Result<Position> {
        if events.is_empty() {
            return Err(EventLogError::EmptyAppend);
        }

        let mut tx = self.pool.begin().await?;

        let mut last_position = Position::new(0);
        for event in &events {
            let position: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO event_log (event_id, stream_name, event_type, payload)
                VALUES ($1, $2, $3, $4)
                RETURNING position
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(stream)
            .bind(&event.event_type)
            .bind(&event.payload)
            .fetch_one(&mut *tx)
            .await?;

            last_position = Position::new(position as u64);
        }

        tx.commit().await?;

        metrics::counter!("event_log_records_appended").increment(1);
        tracing::debug!(stream, position = %last_position, "appended event batch");
        Ok(last_position)
    }

    async fn read_from(
        &self,
        stream: &str,
        from: Option<Position>,
    ) -> Result<Vec<RecordedEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT position, event_id, stream_name, event_type, payload, recorded_at
            FROM event_log
            WHERE stream_name = $1 AND position > $2
            ORDER BY position
            "#,
        )
        .bind(stream)
        .bind(from.map(|p| p.as_u64() as i64).unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn subscribe(&self, stream: &str, from: Option<Position>) -> Result<EventStream> {
        struct PollState {
            pool: PgPool,
            stream: String,
            cursor: u64,
            interval: Duration,
            buffer: VecDeque<RecordedEvent>,
        }

        let state = PollState {
            pool: self.pool.clone(),
            stream: stream.to_string(),
            cursor: from.map(|p| p.as_u64()).unwrap_or(0),
            interval: self.poll_interval,
            buffer: VecDeque::new(),
        };

        let stream = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(event) = state.buffer.pop_front() {
                    state.cursor = event.position.as_u64();
                    return Some((Ok(event), state));
                }

                match Self::fetch_after(&state.pool, &state.stream, state.cursor, 100).await {
                    Ok(events) if events.is_empty() => {
                        tokio::time::sleep(state.interval).await;
                    }
                    Ok(events) => {
                        state.buffer.extend(events);
                    }
                    Err(e) => return Some((Err(e), state)),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
