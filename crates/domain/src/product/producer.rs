//! Event producer: turns accepted commands into the minimal set of facts.

use common::ProductId;
use event_log::{EventData, EventLog};

use crate::error::DomainError;

use super::{CreateProduct, DeleteProduct, Product, ProductCreatedData, ProductEvent, UpdateProduct};

/// The single logical stream shared by all product aggregates.
pub const PRODUCT_STREAM: &str = "product-stream";

/// How updates are translated into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Diff the command against the existing snapshot and emit fine-grained
    /// facts: `StockIncreased`/`StockDecreased` and `PriceChanged` only for
    /// fields that changed, plus a `ProductUpdated` when name, description,
    /// or active flag changed. Nothing changed means nothing is appended.
    #[default]
    FineGrained,

    /// Always emit a single coarse `ProductUpdated` carrying the full new
    /// record.
    Coarse,
}

/// Produces product events and appends them to the log.
///
/// All events for one command go to the log in one atomic append call,
/// preserving their relative order. Validation failures surface to the
/// caller before anything is written.
pub struct ProductProducer<L: EventLog> {
    log: L,
    stream: String,
    strategy: UpdateStrategy,
}

impl<L: EventLog> ProductProducer<L> {
    /// Creates a producer writing to the default product stream with the
    /// fine-grained update strategy.
    pub fn new(log: L) -> Self {
        Self {
            log,
            stream: PRODUCT_STREAM.to_string(),
            strategy: UpdateStrategy::default(),
        }
    }

    /// Overrides the update strategy.
    pub fn with_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides the stream name.
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    /// Returns the stream this producer appends to.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Creates a new product.
    ///
    /// The ID is generated here, never by storage, and `created_at` is
    /// stamped with the current UTC time. Returns the appended event data
    /// so the caller knows the assigned ID.
    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn create(&self, cmd: CreateProduct) -> Result<ProductCreatedData, DomainError> {
        cmd.validate()?;

        let product = Product::new(
            ProductId::generate(),
            cmd.name,
            cmd.description,
            cmd.price,
            cmd.stock,
        );
        let event = ProductEvent::product_created(&product);

        self.append(vec![event.clone()]).await?;

        tracing::info!(product_id = %product.id, "product created");
        match event {
            ProductEvent::ProductCreated(data) => Ok(data),
            _ => unreachable!(),
        }
    }

    /// Updates an existing product, emitting only the facts needed to reach
    /// the commanded state.
    ///
    /// The caller supplies the current snapshot from the projection store;
    /// the command's ID must match it. Returns the emitted events, which is
    /// empty when nothing changed (no append call is made).
    #[tracing::instrument(skip(self, existing, cmd), fields(product_id = %cmd.id))]
    pub async fn update(
        &self,
        existing: &Product,
        cmd: UpdateProduct,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        cmd.validate()?;

        if cmd.id != existing.id {
            return Err(DomainError::IdMismatch {
                command_id: cmd.id.to_string(),
                snapshot_id: existing.id.to_string(),
            });
        }

        let events = match self.strategy {
            UpdateStrategy::FineGrained => diff_events(existing, &cmd),
            UpdateStrategy::Coarse => {
                vec![ProductEvent::ProductUpdated(super::ProductUpdatedData {
                    id: cmd.id.clone(),
                    name: cmd.name.clone(),
                    description: cmd.description.clone(),
                    price: cmd.price,
                    stock: cmd.stock,
                    is_active: cmd.is_active,
                })]
            }
        };

        if events.is_empty() {
            tracing::debug!("update produced no changes, nothing appended");
            return Ok(events);
        }

        self.append(events.clone()).await?;
        tracing::info!(count = events.len(), "update events appended");
        Ok(events)
    }

    /// Deletes a product.
    #[tracing::instrument(skip(self), fields(product_id = %cmd.id))]
    pub async fn delete(&self, cmd: DeleteProduct) -> Result<(), DomainError> {
        self.append(vec![ProductEvent::product_deleted(cmd.id)]).await?;
        tracing::info!("product deletion appended");
        Ok(())
    }

    async fn append(&self, events: Vec<ProductEvent>) -> Result<(), DomainError> {
        let data: Vec<EventData> = events
            .iter()
            .map(ProductEvent::to_event_data)
            .collect::<serde_json::Result<_>>()?;

        self.log.append(&self.stream, data).await?;
        metrics::counter!("producer_events_appended").increment(events.len() as u64);
        Ok(())
    }
}

/// Computes the fine-grained events needed to move `existing` to the state
/// described by `cmd`.
///
/// Stock and price are compared independently; each contributes at most one
/// event carrying exact before/after values and the signed delta. Changes to
/// name, description, or the active flag emit a trailing `ProductUpdated`
/// with the full new record. Event order is stock, then price, then the
/// whole-record update.
pub fn diff_events(existing: &Product, cmd: &UpdateProduct) -> Vec<ProductEvent> {
    let mut events = Vec::new();

    if cmd.stock > existing.stock {
        events.push(ProductEvent::stock_increased(
            cmd.id.clone(),
            existing.stock,
            cmd.stock,
        ));
    } else if cmd.stock < existing.stock {
        events.push(ProductEvent::stock_decreased(
            cmd.id.clone(),
            existing.stock,
            cmd.stock,
        ));
    }

    if cmd.price != existing.price {
        events.push(ProductEvent::price_changed(
            cmd.id.clone(),
            existing.price,
            cmd.price,
        ));
    }

    if cmd.name != existing.name
        || cmd.description != existing.description
        || cmd.is_active != existing.is_active
    {
        events.push(ProductEvent::ProductUpdated(super::ProductUpdatedData {
            id: cmd.id.clone(),
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            price: cmd.price,
            stock: cmd.stock,
            is_active: cmd.is_active,
        }));
    }

    events
}
