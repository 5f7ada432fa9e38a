use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use super::Money;

/// The product projection entity.
///
/// This is the snapshot the projector maintains and the presentation layer
/// queries. It is derived state: the event stream is the source of truth
/// and the row is always reconstructable from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Producer-assigned unique ID, immutable after creation.
    pub id: ProductId,

    /// Product name (non-empty, at most 100 characters).
    pub name: String,

    /// Optional description (at most 500 characters).
    pub description: Option<String>,

    /// Non-negative price.
    pub price: Money,

    /// Units in stock.
    pub stock: u32,

    /// Set once when the product is created.
    pub created_at: DateTime<Utc>,

    /// Whether the product is active. Defaults to true.
    pub is_active: bool,
}

impl Product {
    /// Creates a product snapshot with `created_at` stamped now and
    /// `is_active` defaulted to true.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: Option<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            price,
            stock,
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_active() {
        let product = Product::new(
            ProductId::new("p1"),
            "Widget",
            None,
            Money::from_cents(999),
            10,
        );
        assert!(product.is_active);
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn serialization_roundtrip() {
        let product = Product::new(
            ProductId::new("p1"),
            "Widget",
            Some("A widget".to_string()),
            Money::from_cents(999),
            10,
        );

        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, deserialized);
    }
}
