use thiserror::Error;

/// Errors that can occur when interacting with the event log.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// Attempted to append an empty batch.
    #[error("Cannot append an empty event batch")]
    EmptyAppend,

    /// A live subscription fell behind and records were dropped.
    /// The consumer should resubscribe from its checkpoint.
    #[error("Subscription lagged behind, {skipped} records dropped")]
    SubscriptionLagged { skipped: u64 },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event log operations.
pub type Result<T> = std::result::Result<T, EventLogError>;
