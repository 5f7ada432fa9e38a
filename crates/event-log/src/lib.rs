//! Durable append-only event log.
//!
//! This crate defines the storage boundary of the sync pipeline:
//! - [`EventLog`] — append/read/subscribe over a named stream with
//!   at-least-once delivery in stream order
//! - [`CheckpointStore`] — persisted consumer positions for resume-after-restart
//! - In-memory implementations for tests and a PostgreSQL implementation
//!   for production

pub mod checkpoint;
pub mod error;
pub mod log;
pub mod memory;
pub mod postgres;
pub mod record;

pub use checkpoint::{CheckpointStore, InMemoryCheckpointStore, PostgresCheckpointStore};
pub use error::{EventLogError, Result};
pub use log::{EventLog, EventStream};
pub use memory::InMemoryEventLog;
pub use postgres::PostgresEventLog;
pub use record::{EventData, EventId, Position, RecordedEvent};
