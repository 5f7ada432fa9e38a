//! Projection error types.

use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event log.
    #[error("Event log error: {0}")]
    EventLog(#[from] event_log::EventLogError),

    /// A database error occurred in the projection store.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A record could not be applied after exhausting retries and the
    /// failure policy is to halt.
    #[error("Record at position {position} could not be applied: {source}")]
    RecordFailed {
        position: u64,
        #[source]
        source: Box<ProjectionError>,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
