//! Product read model: the query side of the pipeline.
//!
//! This crate provides:
//! - [`ProductStore`] trait for the durable keyed product snapshots the
//!   presentation layer queries, with in-memory and PostgreSQL impls
//! - [`ProductProjector`] applying each event idempotently, so exactly-once
//!   effect survives at-least-once delivery
//! - [`ProductSubscriber`], the single sequential consumption loop per
//!   stream, with checkpointing and resubscribe-with-backoff

pub mod error;
pub mod postgres;
pub mod projector;
pub mod store;
pub mod subscriber;

pub use error::{ProjectionError, Result};
pub use postgres::PostgresProductStore;
pub use projector::ProductProjector;
pub use store::{InMemoryProductStore, ProductStore};
pub use subscriber::{FailurePolicy, ProductSubscriber, SubscriberConfig};
