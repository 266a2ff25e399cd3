//! Engine errors

use uuid::Uuid;

use crate::srs::ConfigError;
use crate::storage::StorageError;

/// Errors surfaced by the queue and session operations
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The SRS configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Entry does not exist, is already completed, or belongs to another learner
    #[error("Queue entry not found: {0}")]
    EntryNotFound(Uuid),
    /// Session does not exist
    #[error("Review session not found: {0}")]
    SessionNotFound(Uuid),
    /// Session was already closed
    #[error("Review session already ended: {0}")]
    SessionAlreadyEnded(Uuid),
    /// A per-learner lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;
