//! Static event catalog: type tag to decoder.
//!
//! The catalog is an explicit table rather than any kind of runtime type
//! scan, so the supported event set is auditable and an unknown tag is a
//! deterministic, safely skippable condition instead of a crash.

use serde_json::Value;
use thiserror::Error;

use crate::product::{
    PriceChangedData, ProductCreatedData, ProductDeletedData, ProductEvent, ProductUpdatedData,
    StockDecreasedData, StockIncreasedData,
};

/// Decodes a raw payload into a concrete event.
pub type Decoder = fn(&Value) -> serde_json::Result<ProductEvent>;

/// Errors from catalog-driven decoding.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The type tag is not registered in the catalog.
    #[error("Unknown event type: {0}")]
    UnknownType(String),

    /// The payload did not match the registered schema for its tag.
    #[error("Malformed payload for {event_type}: {source}")]
    Payload {
        event_type: String,
        source: serde_json::Error,
    },
}

fn decode_created(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<ProductCreatedData>(payload.clone()).map(ProductEvent::ProductCreated)
}

fn decode_updated(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<ProductUpdatedData>(payload.clone()).map(ProductEvent::ProductUpdated)
}

fn decode_stock_increased(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<StockIncreasedData>(payload.clone()).map(ProductEvent::StockIncreased)
}

fn decode_stock_decreased(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<StockDecreasedData>(payload.clone()).map(ProductEvent::StockDecreased)
}

fn decode_price_changed(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<PriceChangedData>(payload.clone()).map(ProductEvent::PriceChanged)
}

fn decode_deleted(payload: &Value) -> serde_json::Result<ProductEvent> {
    serde_json::from_value::<ProductDeletedData>(payload.clone()).map(ProductEvent::ProductDeleted)
}

/// Every event type the pipeline understands. Both update schemas (coarse
/// `ProductUpdated` and the fine-grained deltas) are registered permanently,
/// so a stream written by either producer strategy decodes.
const CATALOG: &[(&str, Decoder)] = &[
    ("ProductCreated", decode_created),
    ("ProductUpdated", decode_updated),
    ("StockIncreased", decode_stock_increased),
    ("StockDecreased", decode_stock_decreased),
    ("PriceChanged", decode_price_changed),
    ("ProductDeleted", decode_deleted),
];

/// Static registry mapping event type tags to decoders.
pub struct EventCatalog;

impl EventCatalog {
    /// Resolves a type tag to its decoder, or None for an unknown tag.
    pub fn resolve(event_type: &str) -> Option<Decoder> {
        CATALOG
            .iter()
            .find(|(tag, _)| *tag == event_type)
            .map(|(_, decoder)| *decoder)
    }

    /// Decodes a tagged payload into a concrete event.
    pub fn decode(event_type: &str, payload: &Value) -> Result<ProductEvent, CatalogError> {
        let decoder = Self::resolve(event_type)
            .ok_or_else(|| CatalogError::UnknownType(event_type.to_string()))?;

        decoder(payload).map_err(|source| CatalogError::Payload {
            event_type: event_type.to_string(),
            source,
        })
    }

    /// Iterates over every registered type tag.
    pub fn tags() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|(tag, _)| *tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Money;
    use common::ProductId;

    #[test]
    fn resolve_known_tags() {
        for tag in EventCatalog::tags() {
            assert!(EventCatalog::resolve(tag).is_some(), "missing decoder for {tag}");
        }
        assert_eq!(EventCatalog::tags().count(), 6);
    }

    #[test]
    fn resolve_unknown_tag_returns_none() {
        assert!(EventCatalog::resolve("OrderShipped").is_none());
    }

    #[test]
    fn decode_roundtrips_every_variant() {
        let id = ProductId::new("p1");
        let events = vec![
            ProductEvent::product_created(&crate::product::Product::new(
                id.clone(),
                "Widget",
                None,
                Money::from_cents(999),
                10,
            )),
            ProductEvent::stock_increased(id.clone(), 10, 25),
            ProductEvent::stock_decreased(id.clone(), 25, 10),
            ProductEvent::price_changed(id.clone(), Money::from_cents(999), Money::from_cents(1500)),
            ProductEvent::product_deleted(id),
        ];

        for event in events {
            let data = event.to_event_data().unwrap();
            let decoded = EventCatalog::decode(&data.event_type, &data.payload).unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn decode_unknown_tag_errors() {
        let result = EventCatalog::decode("OrderShipped", &serde_json::json!({}));
        assert!(matches!(result, Err(CatalogError::UnknownType(_))));
    }

    #[test]
    fn decode_malformed_payload_errors() {
        let result = EventCatalog::decode("StockIncreased", &serde_json::json!({"id": 42}));
        assert!(matches!(result, Err(CatalogError::Payload { .. })));
    }
}
