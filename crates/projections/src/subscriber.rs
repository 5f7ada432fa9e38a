//! Stream subscription and dispatch.
//!
//! One long-lived, strictly sequential consumption loop per stream: records
//! are decoded through the event catalog and handed to the projector one at
//! a time, in arrival order. Because every product shares one stream and one
//! loop, events for a given product apply in exactly the order they were
//! appended.
//!
//! The loop checkpoints after every record and resubscribes from the
//! checkpoint with exponential backoff when the subscription drops, so a
//! restart resumes exactly after the last handled position.

use std::time::Duration;

use domain::{CatalogError, EventCatalog};
use event_log::{CheckpointStore, EventLog, RecordedEvent};
use futures_util::StreamExt;
use tokio::sync::watch;

use crate::projector::ProductProjector;
use crate::store::ProductStore;
use crate::{ProjectionError, Result};

/// What to do with a record that still fails after all retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log at error level, count it, and advance past the record. The
    /// projection may drift until the next rebuild, but the loop survives.
    #[default]
    SkipAndAlert,

    /// Stop the loop and surface the error to the supervisor.
    Halt,
}

/// Tuning knobs for the subscription loop.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Base delay for exponential backoff on resubscription.
    pub reconnect_base_delay: Duration,

    /// Cap on the resubscription delay.
    pub reconnect_max_delay: Duration,

    /// How many times to attempt applying one record before giving up.
    pub retry_attempts: u32,

    /// Delay between apply attempts, multiplied by the attempt number.
    pub retry_base_delay: Duration,

    /// What to do once retries are exhausted.
    pub failure_policy: FailurePolicy,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            reconnect_base_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(30),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(100),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// The consumption loop feeding the product projector from the event log.
pub struct ProductSubscriber<L, C, S>
where
    L: EventLog,
    C: CheckpointStore,
    S: ProductStore,
{
    log: L,
    checkpoints: C,
    projector: ProductProjector<S>,
    stream: String,
    consumer: String,
    config: SubscriberConfig,
}

impl<L, C, S> ProductSubscriber<L, C, S>
where
    L: EventLog,
    C: CheckpointStore,
    S: ProductStore,
{
    /// Creates a subscriber with the default configuration.
    pub fn new(
        log: L,
        checkpoints: C,
        projector: ProductProjector<S>,
        stream: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            log,
            checkpoints,
            projector,
            stream: stream.into(),
            consumer: consumer.into(),
            config: SubscriberConfig::default(),
        }
    }

    /// Overrides the loop configuration.
    pub fn with_config(mut self, config: SubscriberConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns a reference to the projector's store.
    pub fn store(&self) -> &S {
        self.projector.store()
    }

    /// Runs the consumption loop until the shutdown signal fires or, under
    /// [`FailurePolicy::Halt`], a record permanently fails.
    ///
    /// The shutdown signal is observed between records, never mid-handler.
    #[tracing::instrument(skip(self, shutdown), fields(stream = %self.stream, consumer = %self.consumer))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut backoff = self.config.reconnect_base_delay;

        loop {
            if *shutdown.borrow() {
                tracing::info!("shutdown requested, stopping subscriber");
                return Ok(());
            }

            // Checkpoint-store failures get the same backoff-and-retry
            // treatment as subscribe failures; redelivery after resubscribe
            // is absorbed by the idempotent handlers.
            let from = match self.checkpoints.load(&self.consumer).await {
                Ok(from) => from,
                Err(e) => {
                    tracing::warn!(error = %e, "checkpoint load failed, backing off");
                    metrics::counter!("subscriber_checkpoint_failures").increment(1);
                    if self.wait_or_shutdown(&mut shutdown, backoff).await {
                        return Ok(());
                    }
                    backoff = self.next_backoff(backoff);
                    continue;
                }
            };
            let mut records = match self.log.subscribe(&self.stream, from).await {
                Ok(stream) => {
                    tracing::info!(?from, "subscribed to stream");
                    stream
                }
                Err(e) => {
                    tracing::warn!(error = %e, "subscribe failed, backing off");
                    if self.wait_or_shutdown(&mut shutdown, backoff).await {
                        return Ok(());
                    }
                    backoff = self.next_backoff(backoff);
                    continue;
                }
            };

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::info!("shutdown requested, stopping subscriber");
                            return Ok(());
                        }
                    }
                    next = records.next() => match next {
                        Some(Ok(record)) => {
                            self.handle_record(&record).await?;
                            if let Err(e) = self
                                .checkpoints
                                .save(&self.consumer, record.position)
                                .await
                            {
                                tracing::warn!(
                                    error = %e,
                                    position = %record.position,
                                    "checkpoint save failed, resubscribing from last checkpoint"
                                );
                                metrics::counter!("subscriber_checkpoint_failures").increment(1);
                                break;
                            }
                            backoff = self.config.reconnect_base_delay;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "subscription error, resubscribing from checkpoint");
                            metrics::counter!("subscriber_drops").increment(1);
                            break;
                        }
                        None => {
                            tracing::warn!("subscription ended, resubscribing from checkpoint");
                            metrics::counter!("subscriber_drops").increment(1);
                            break;
                        }
                    }
                }
            }

            if self.wait_or_shutdown(&mut shutdown, backoff).await {
                return Ok(());
            }
            backoff = self.next_backoff(backoff);
        }
    }

    /// Rebuilds the projection from the start of the stream: clears the
    /// store, resets the checkpoint, then replays every record currently in
    /// the log. The projection is derived state, so this is always safe.
    #[tracing::instrument(skip(self), fields(stream = %self.stream, consumer = %self.consumer))]
    pub async fn rebuild(&self) -> Result<()> {
        self.projector.store().clear().await?;
        self.checkpoints.reset(&self.consumer).await?;

        let records = self.log.read_from(&self.stream, None).await?;
        let replayed = records.len();
        for record in records {
            self.handle_record(&record).await?;
            self.checkpoints.save(&self.consumer, record.position).await?;
        }

        tracing::info!(replayed, "projection rebuild complete");
        Ok(())
    }

    /// Decodes and applies one record.
    ///
    /// Unknown tags and malformed payloads are logged and skipped; they
    /// never stop the loop. Store failures are retried with backoff and
    /// then handled per the failure policy. The checkpoint is only advanced
    /// by the caller after this returns Ok, and a skipped record is always
    /// flagged before being advanced past.
    async fn handle_record(&self, record: &RecordedEvent) -> Result<()> {
        let event = match EventCatalog::decode(&record.event_type, &record.payload) {
            Ok(event) => event,
            Err(CatalogError::UnknownType(tag)) => {
                tracing::warn!(
                    position = %record.position,
                    event_type = %tag,
                    "unknown event type, skipping record"
                );
                metrics::counter!("subscriber_unknown_events").increment(1);
                return Ok(());
            }
            Err(CatalogError::Payload { event_type, source }) => {
                tracing::warn!(
                    position = %record.position,
                    event_type = %event_type,
                    error = %source,
                    "malformed payload, skipping record"
                );
                metrics::counter!("subscriber_decode_failures").increment(1);
                return Ok(());
            }
        };

        let attempts = self.config.retry_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.projector.apply(&event).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        position = %record.position,
                        event_type = %record.event_type,
                        attempt,
                        error = %e,
                        "apply failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_base_delay * attempt).await;
                    }
                }
            }
        }

        let Some(source) = last_error else {
            return Ok(());
        };
        metrics::counter!("subscriber_records_failed").increment(1);

        match self.config.failure_policy {
            FailurePolicy::SkipAndAlert => {
                tracing::error!(
                    position = %record.position,
                    event_type = %record.event_type,
                    error = %source,
                    "giving up on record; projection may drift until rebuilt"
                );
                Ok(())
            }
            FailurePolicy::Halt => Err(ProjectionError::RecordFailed {
                position: record.position.as_u64(),
                source: Box::new(source),
            }),
        }
    }

    /// Sleeps for `delay`, returning true if shutdown fired first.
    async fn wait_or_shutdown(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        delay: Duration,
    ) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        }
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.config.reconnect_max_delay)
    }
}
