//! Buffer error types

use thiserror::Error;

use crate::BufferKey;

/// Durable buffer errors
#[derive(Debug, Error)]
pub enum BufferError {
    /// Store could not be opened (bad path, permissions, corrupt header)
    #[error("failed to open buffer store '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// Another process held the store past the bounded wait
    #[error("buffer store '{path}' is held by another process")]
    Timeout { path: String },

    /// Partition was never created; expected on first-ever run
    #[error("partition not found: {0}")]
    PartitionNotFound(String),

    /// Batch could not be encoded for storage
    #[error("failed to serialize batch: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    /// A stored entry could not be decoded; surfaced, never skipped
    #[error("failed to deserialize entry {key} in partition '{partition}': {message}")]
    DeserializationFailed {
        partition: String,
        key: BufferKey,
        message: String,
    },

    /// Underlying storage I/O failure on write/read/delete
    #[error("buffer storage error: {0}")]
    StorageFailed(#[from] rusqlite::Error),

    /// Filesystem error while preparing the store file
    #[error("buffer io error: {0}")]
    Io(#[from] std::io::Error),
}
