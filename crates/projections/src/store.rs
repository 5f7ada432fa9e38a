//! Durable keyed storage for product snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use domain::Product;
use tokio::sync::RwLock;

use crate::Result;

/// Storage for the product read model.
///
/// The projector is the only writer; the presentation layer only reads.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Finds a product by ID. Returns None if no row exists.
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts or fully replaces a product row.
    async fn upsert(&self, product: Product) -> Result<()>;

    /// Removes a product row. Removing a missing row is a no-op.
    async fn delete_by_id(&self, id: &ProductId) -> Result<()>;

    /// Lists all products, newest first.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Removes every row. Used when rebuilding the projection from the log.
    async fn clear(&self) -> Result<()>;
}

/// In-memory product store for testing.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
        Ok(())
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<()> {
        self.products.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn clear(&self) -> Result<()> {
        self.products.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn product(id: &str) -> Product {
        Product::new(
            ProductId::new(id),
            format!("Product {id}"),
            None,
            Money::from_cents(999),
            10,
        )
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let store = InMemoryProductStore::new();
        assert!(store
            .find_by_id(&ProductId::new("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn upsert_then_find() {
        let store = InMemoryProductStore::new();
        let p = product("p1");
        store.upsert(p.clone()).await.unwrap();

        let found = store.find_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(found, p);
    }

    #[tokio::test]
    async fn upsert_replaces_existing() {
        let store = InMemoryProductStore::new();
        let mut p = product("p1");
        store.upsert(p.clone()).await.unwrap();

        p.stock = 99;
        store.upsert(p.clone()).await.unwrap();

        let found = store.find_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(found.stock, 99);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = InMemoryProductStore::new();
        let p = product("p1");
        store.upsert(p.clone()).await.unwrap();

        store.delete_by_id(&p.id).await.unwrap();
        assert!(store.find_by_id(&p.id).await.unwrap().is_none());

        // Deleting again is a no-op.
        store.delete_by_id(&p.id).await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = InMemoryProductStore::new();

        let older = product("p1");
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let newer = product("p2");

        store.upsert(older.clone()).await.unwrap();
        store.upsert(newer.clone()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
    }

    #[tokio::test]
    async fn clear_empties_store() {
        let store = InMemoryProductStore::new();
        store.upsert(product("p1")).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await, 0);
    }
}
