//! Product domain events.
//!
//! Events are immutable facts appended to the log; they are never mutated
//! or deleted. The type tag returned by [`ProductEvent::event_type`] is the
//! wire-level dispatch key and must remain stable for every producer and
//! consumer sharing a stream.

use chrono::{DateTime, Utc};
use common::ProductId;
use event_log::EventData;
use serde::{Deserialize, Serialize};

use super::{Money, Product};

/// Events that can occur on a product aggregate.
///
/// Two update schemas coexist on one stream: the coarse whole-record
/// `ProductUpdated` and the fine-grained stock/price deltas. The projector
/// decodes both permanently, so streams written by either producer strategy
/// converge to the same read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    /// A product came into existence.
    ProductCreated(ProductCreatedData),

    /// Whole-record update carrying the full new state.
    ProductUpdated(ProductUpdatedData),

    /// Stock went up by a known amount.
    StockIncreased(StockIncreasedData),

    /// Stock went down by a known amount.
    StockDecreased(StockDecreasedData),

    /// Price changed, carrying the signed difference.
    PriceChanged(PriceChangedData),

    /// The product was deleted. Terminal: later non-create events for the
    /// same ID are inert.
    ProductDeleted(ProductDeletedData),
}

/// Data for ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreatedData {
    /// Producer-assigned ID, never store-generated.
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub stock: u32,
    pub price: Money,
    /// UTC creation time, stamped by the producer.
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Data for ProductUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdatedData {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub is_active: bool,
}

/// Data for StockIncreased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIncreasedData {
    pub id: ProductId,
    pub old_stock: u32,
    pub new_stock: u32,
    pub increased_amount: u32,
}

/// Data for StockDecreased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecreasedData {
    pub id: ProductId,
    pub old_stock: u32,
    pub new_stock: u32,
    pub decreased_amount: u32,
}

/// Data for PriceChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChangedData {
    pub id: ProductId,
    pub old_price: Money,
    pub new_price: Money,
    /// Signed: negative when the price went down.
    pub price_difference: Money,
}

/// Data for ProductDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeletedData {
    pub id: ProductId,
}

impl ProductEvent {
    /// Returns the stable wire-level type tag for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "ProductCreated",
            ProductEvent::ProductUpdated(_) => "ProductUpdated",
            ProductEvent::StockIncreased(_) => "StockIncreased",
            ProductEvent::StockDecreased(_) => "StockDecreased",
            ProductEvent::PriceChanged(_) => "PriceChanged",
            ProductEvent::ProductDeleted(_) => "ProductDeleted",
        }
    }

    /// Returns the product ID this event refers to.
    pub fn product_id(&self) -> &ProductId {
        match self {
            ProductEvent::ProductCreated(d) => &d.id,
            ProductEvent::ProductUpdated(d) => &d.id,
            ProductEvent::StockIncreased(d) => &d.id,
            ProductEvent::StockDecreased(d) => &d.id,
            ProductEvent::PriceChanged(d) => &d.id,
            ProductEvent::ProductDeleted(d) => &d.id,
        }
    }

    /// Encodes this event for appending: the variant's data struct becomes
    /// the payload and the type tag travels alongside it.
    pub fn to_event_data(&self) -> serde_json::Result<EventData> {
        let payload = match self {
            ProductEvent::ProductCreated(d) => serde_json::to_value(d)?,
            ProductEvent::ProductUpdated(d) => serde_json::to_value(d)?,
            ProductEvent::StockIncreased(d) => serde_json::to_value(d)?,
            ProductEvent::StockDecreased(d) => serde_json::to_value(d)?,
            ProductEvent::PriceChanged(d) => serde_json::to_value(d)?,
            ProductEvent::ProductDeleted(d) => serde_json::to_value(d)?,
        };
        Ok(EventData::new(self.event_type(), payload))
    }

    /// Creates a ProductCreated event from a new product snapshot.
    pub fn product_created(product: &Product) -> Self {
        ProductEvent::ProductCreated(ProductCreatedData {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            stock: product.stock,
            price: product.price,
            created_at: product.created_at,
            is_active: product.is_active,
        })
    }

    /// Creates a ProductUpdated event carrying the full new record.
    pub fn product_updated(product: &Product) -> Self {
        ProductEvent::ProductUpdated(ProductUpdatedData {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            is_active: product.is_active,
        })
    }

    /// Creates a StockIncreased event. `new_stock` must exceed `old_stock`.
    pub fn stock_increased(id: ProductId, old_stock: u32, new_stock: u32) -> Self {
        ProductEvent::StockIncreased(StockIncreasedData {
            id,
            old_stock,
            new_stock,
            increased_amount: new_stock - old_stock,
        })
    }

    /// Creates a StockDecreased event. `old_stock` must exceed `new_stock`.
    pub fn stock_decreased(id: ProductId, old_stock: u32, new_stock: u32) -> Self {
        ProductEvent::StockDecreased(StockDecreasedData {
            id,
            old_stock,
            new_stock,
            decreased_amount: old_stock - new_stock,
        })
    }

    /// Creates a PriceChanged event with the signed difference.
    pub fn price_changed(id: ProductId, old_price: Money, new_price: Money) -> Self {
        ProductEvent::PriceChanged(PriceChangedData {
            id,
            old_price,
            new_price,
            price_difference: new_price.subtract(old_price),
        })
    }

    /// Creates a ProductDeleted event.
    pub fn product_deleted(id: ProductId) -> Self {
        ProductEvent::ProductDeleted(ProductDeletedData { id })
    }
}
