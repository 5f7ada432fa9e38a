//! Domain error types.

use event_log::EventLogError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A command failed validation before any event was appended.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A command referenced a different aggregate than the loaded snapshot.
    #[error("Command targets product {command_id} but snapshot is for {snapshot_id}")]
    IdMismatch {
        command_id: String,
        snapshot_id: String,
    },

    /// An error occurred in the event log.
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
