//! Error types for the storage layer.

use shelf_core::RecordId;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No collection with this name.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// No record with this id in the collection.
    #[error("record {id} not found in {collection}")]
    RecordNotFound { collection: String, id: RecordId },

    /// A record with this id already exists.
    #[error("duplicate id {id} in {collection}")]
    DuplicateId { collection: String, id: RecordId },

    /// Every id above the largest stored one is taken.
    #[error("no free id left in {collection}")]
    IdSpaceExhausted { collection: String },

    /// The database file is not an object of record arrays.
    #[error("invalid database: {0}")]
    InvalidDatabase(String),

    /// Reading or writing the database file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the error means "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound(_) | Self::RecordNotFound { .. }
        )
    }
}
