//! Idempotent event application.
//!
//! One handler per event kind, each independently idempotent: applying the
//! same event any number of times leaves the same end state as applying it
//! once, which is what makes at-least-once delivery safe. Every handler is
//! a single read-then-conditionally-write against the store; no transaction
//! spans multiple events.

use domain::{Product, ProductEvent};

use crate::store::ProductStore;
use crate::Result;

/// Applies product events to the read model.
pub struct ProductProjector<S: ProductStore> {
    store: S,
}

impl<S: ProductStore> ProductProjector<S> {
    /// Creates a projector writing to the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies a single event. Safe to call again with the same event.
    pub async fn apply(&self, event: &ProductEvent) -> Result<()> {
        match event {
            ProductEvent::ProductCreated(data) => {
                if self.store.find_by_id(&data.id).await?.is_some() {
                    // Redelivery: the row already exists.
                    tracing::debug!(product_id = %data.id, "create already applied");
                    return Ok(());
                }

                self.store
                    .upsert(Product {
                        id: data.id.clone(),
                        name: data.name.clone(),
                        description: data.description.clone(),
                        price: data.price,
                        stock: data.stock,
                        created_at: data.created_at,
                        is_active: data.is_active,
                    })
                    .await?;
                tracing::info!(product_id = %data.id, name = %data.name, "product row created");
            }
            ProductEvent::ProductUpdated(data) => {
                let Some(mut existing) = self.store.find_by_id(&data.id).await? else {
                    tracing::debug!(product_id = %data.id, "update for unknown product ignored");
                    return Ok(());
                };

                existing.name = data.name.clone();
                existing.description = data.description.clone();
                existing.price = data.price;
                existing.stock = data.stock;
                existing.is_active = data.is_active;
                self.store.upsert(existing).await?;
                tracing::info!(product_id = %data.id, "product row updated");
            }
            ProductEvent::StockIncreased(data) => {
                let Some(mut existing) = self.store.find_by_id(&data.id).await? else {
                    tracing::debug!(product_id = %data.id, "stock change for unknown product ignored");
                    return Ok(());
                };

                // Absolute overwrite, not a relative add: redelivering the
                // same event is then harmless even though it encodes a delta.
                existing.stock = data.new_stock;
                self.store.upsert(existing).await?;
                tracing::info!(
                    product_id = %data.id,
                    old_stock = data.old_stock,
                    new_stock = data.new_stock,
                    increased = data.increased_amount,
                    "stock increased"
                );
            }
            ProductEvent::StockDecreased(data) => {
                let Some(mut existing) = self.store.find_by_id(&data.id).await? else {
                    tracing::debug!(product_id = %data.id, "stock change for unknown product ignored");
                    return Ok(());
                };

                existing.stock = data.new_stock;
                self.store.upsert(existing).await?;
                tracing::info!(
                    product_id = %data.id,
                    old_stock = data.old_stock,
                    new_stock = data.new_stock,
                    decreased = data.decreased_amount,
                    "stock decreased"
                );
            }
            ProductEvent::PriceChanged(data) => {
                let Some(mut existing) = self.store.find_by_id(&data.id).await? else {
                    tracing::debug!(product_id = %data.id, "price change for unknown product ignored");
                    return Ok(());
                };

                existing.price = data.new_price;
                self.store.upsert(existing).await?;
                tracing::info!(
                    product_id = %data.id,
                    old_price = %data.old_price,
                    new_price = %data.new_price,
                    difference = %data.price_difference,
                    "price changed"
                );
            }
            ProductEvent::ProductDeleted(data) => {
                if self.store.find_by_id(&data.id).await?.is_none() {
                    tracing::debug!(product_id = %data.id, "delete for unknown product ignored");
                    return Ok(());
                }

                self.store.delete_by_id(&data.id).await?;
                tracing::info!(product_id = %data.id, "product row deleted");
            }
        }

        metrics::counter!("projector_events_applied").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use domain::Money;

    use crate::store::InMemoryProductStore;

    fn projector() -> ProductProjector<InMemoryProductStore> {
        ProductProjector::new(InMemoryProductStore::new())
    }

    fn created(id: &str, stock: u32, price_cents: i64) -> ProductEvent {
        ProductEvent::product_created(&Product::new(
            ProductId::new(id),
            "Widget",
            None,
            Money::from_cents(price_cents),
            stock,
        ))
    }

    #[tokio::test]
    async fn created_inserts_row_verbatim() {
        let projector = projector();
        projector.apply(&created("p1", 10, 999)).await.unwrap();

        let row = projector
            .store()
            .find_by_id(&ProductId::new("p1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "Widget");
        assert_eq!(row.stock, 10);
        assert_eq!(row.price, Money::from_cents(999));
        assert!(row.is_active);
    }

    #[tokio::test]
    async fn created_is_idempotent() {
        let projector = projector();
        let event = created("p1", 10, 999);

        projector.apply(&event).await.unwrap();
        let once = projector
            .store()
            .find_by_id(&ProductId::new("p1"))
            .await
            .unwrap()
            .unwrap();

        projector.apply(&event).await.unwrap();
        let twice = projector
            .store()
            .find_by_id(&ProductId::new("p1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(once, twice);
        assert_eq!(projector.store().count().await, 1);
    }

    #[tokio::test]
    async fn stock_events_apply_in_delivery_order() {
        let projector = projector();
        let id = ProductId::new("p1");
        projector.apply(&created("p1", 100, 999)).await.unwrap();

        let dec = ProductEvent::stock_decreased(id.clone(), 100, 80);
        let inc = ProductEvent::stock_increased(id.clone(), 80, 95);

        projector.apply(&dec).await.unwrap();
        projector.apply(&inc).await.unwrap();
        let forward = projector.store().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(forward.stock, 95);

        // Reverse order lands on a different (by design) final value:
        // the projector applies in delivery order without reordering.
        let projector = self::projector();
        projector.apply(&created("p1", 100, 999)).await.unwrap();
        projector.apply(&inc).await.unwrap();
        projector.apply(&dec).await.unwrap();
        let reverse = projector.store().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(reverse.stock, 80);
    }

    #[tokio::test]
    async fn stock_redelivery_is_idempotent() {
        let projector = projector();
        let id = ProductId::new("p1");
        projector.apply(&created("p1", 100, 999)).await.unwrap();

        let dec = ProductEvent::stock_decreased(id.clone(), 100, 80);
        projector.apply(&dec).await.unwrap();
        projector.apply(&dec).await.unwrap();

        let row = projector.store().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(row.stock, 80);
    }

    #[tokio::test]
    async fn price_changed_sets_new_price() {
        let projector = projector();
        let id = ProductId::new("p1");
        projector.apply(&created("p1", 10, 1000)).await.unwrap();

        let event =
            ProductEvent::price_changed(id.clone(), Money::from_cents(1000), Money::from_cents(1500));
        projector.apply(&event).await.unwrap();

        let row = projector.store().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(row.price, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn updated_overwrites_mutable_fields_only() {
        let projector = projector();
        let id = ProductId::new("p1");
        projector.apply(&created("p1", 10, 999)).await.unwrap();
        let before = projector.store().find_by_id(&id).await.unwrap().unwrap();

        let event = ProductEvent::product_updated(&Product {
            id: id.clone(),
            name: "Gadget".to_string(),
            description: Some("updated".to_string()),
            price: Money::from_cents(1500),
            stock: 3,
            created_at: chrono::Utc::now(),
            is_active: false,
        });
        projector.apply(&event).await.unwrap();

        let row = projector.store().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(row.name, "Gadget");
        assert_eq!(row.stock, 3);
        assert!(!row.is_active);
        assert_eq!(row.created_at, before.created_at);
    }

    #[tokio::test]
    async fn events_for_missing_product_are_no_ops() {
        let projector = projector();
        let id = ProductId::new("ghost");

        projector
            .apply(&ProductEvent::stock_increased(id.clone(), 0, 5))
            .await
            .unwrap();
        projector
            .apply(&ProductEvent::price_changed(
                id.clone(),
                Money::zero(),
                Money::from_cents(100),
            ))
            .await
            .unwrap();
        projector
            .apply(&ProductEvent::product_deleted(id.clone()))
            .await
            .unwrap();

        assert!(projector.store().find_by_id(&id).await.unwrap().is_none());
        assert_eq!(projector.store().count().await, 0);
    }

    #[tokio::test]
    async fn tombstone_is_final() {
        let projector = projector();
        let id = ProductId::new("p1");
        projector.apply(&created("p1", 10, 999)).await.unwrap();
        projector
            .apply(&ProductEvent::product_deleted(id.clone()))
            .await
            .unwrap();

        // Replaying earlier non-create events must not resurrect the row.
        projector
            .apply(&ProductEvent::stock_increased(id.clone(), 10, 25))
            .await
            .unwrap();
        projector
            .apply(&ProductEvent::price_changed(
                id.clone(),
                Money::from_cents(999),
                Money::from_cents(1500),
            ))
            .await
            .unwrap();
        projector
            .apply(&ProductEvent::product_updated(&Product::new(
                id.clone(),
                "Zombie",
                None,
                Money::zero(),
                1,
            )))
            .await
            .unwrap();

        assert!(projector.store().find_by_id(&id).await.unwrap().is_none());
    }
}
