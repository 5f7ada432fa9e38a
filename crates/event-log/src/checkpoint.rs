//! Persisted consumer positions.
//!
//! A subscriber records the last position it fully handled; after a crash
//! or restart it resumes strictly after that position instead of replaying
//! the stream from the start.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{Position, Result};

/// Durable storage for consumer positions, keyed by consumer name.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the last saved position for a consumer.
    ///
    /// Returns None if the consumer has never saved a checkpoint.
    async fn load(&self, consumer: &str) -> Result<Option<Position>>;

    /// Saves the position a consumer has handled up to.
    async fn save(&self, consumer: &str, position: Position) -> Result<()>;

    /// Removes a consumer's checkpoint so the next run starts from the
    /// beginning of the stream. Used when rebuilding a projection.
    async fn reset(&self, consumer: &str) -> Result<()>;
}

/// In-memory checkpoint store for testing.
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    positions: Arc<RwLock<HashMap<String, Position>>>,
}

impl InMemoryCheckpointStore {
    /// Creates a new empty checkpoint store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, consumer: &str) -> Result<Option<Position>> {
        Ok(self.positions.read().await.get(consumer).copied())
    }

    async fn save(&self, consumer: &str, position: Position) -> Result<()> {
        self.positions
            .write()
            .await
            .insert(consumer.to_string(), position);
        Ok(())
    }

    async fn reset(&self, consumer: &str) -> Result<()> {
        self.positions.write().await.remove(consumer);
        Ok(())
    }
}

/// PostgreSQL-backed checkpoint store using the `consumer_offsets` table.
#[derive(Clone)]
pub struct PostgresCheckpointStore {
    pool: PgPool,
}

impl PostgresCheckpointStore {
    /// Creates a new PostgreSQL checkpoint store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for PostgresCheckpointStore {
    async fn load(&self, consumer: &str) -> Result<Option<Position>> {
        let position: Option<i64> =
            sqlx::query_scalar("SELECT position FROM consumer_offsets WHERE consumer_name = $1")
                .bind(consumer)
                .fetch_optional(&self.pool)
                .await?;

        Ok(position.map(|p| Position::new(p as u64)))
    }

    async fn save(&self, consumer: &str, position: Position) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_offsets (consumer_name, position, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (consumer_name)
            DO UPDATE SET position = EXCLUDED.position, updated_at = now()
            "#,
        )
        .bind(consumer)
        .bind(position.as_u64() as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset(&self, consumer: &str) -> Result<()> {
        sqlx::query("DELETE FROM consumer_offsets WHERE consumer_name = $1")
            .bind(consumer)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_none_for_unknown_consumer() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let store = InMemoryCheckpointStore::new();
        store.save("c1", Position::new(5)).await.unwrap();
        assert_eq!(store.load("c1").await.unwrap(), Some(Position::new(5)));

        store.save("c1", Position::new(9)).await.unwrap();
        assert_eq!(store.load("c1").await.unwrap(), Some(Position::new(9)));
    }

    #[tokio::test]
    async fn consumers_are_independent() {
        let store = InMemoryCheckpointStore::new();
        store.save("c1", Position::new(5)).await.unwrap();
        assert!(store.load("c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_removes_checkpoint() {
        let store = InMemoryCheckpointStore::new();
        store.save("c1", Position::new(5)).await.unwrap();
        store.reset("c1").await.unwrap();
        assert!(store.load("c1").await.unwrap().is_none());
    }
}
