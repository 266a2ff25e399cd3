//! Storage Module
//!
//! Persistence collaborator for the review engine:
//! - [`ReviewStore`] trait the queue and sessions talk to
//! - [`MemoryStore`] for tests and embedding
//! - [`SqliteStore`] with versioned schema migrations

mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use migrations::{Migration, MIGRATIONS};
pub use sqlite::SqliteStore;

use uuid::Uuid;

use crate::item::{ItemKey, LearnerId, StudyItemProgress};
use crate::queue::ReviewQueueEntry;
use crate::session::{ReviewResult, ReviewSession};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored value no longer parses
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// A connection or map lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Load/save operations the engine needs from a backing store
///
/// Implementations must be safe to share between threads. The engine
/// serialises writes per learner, so a store only has to make each call
/// atomic on its own.
pub trait ReviewStore: Send + Sync {
    /// All queue entries (completed and not) for a learner
    fn load_entries(&self, learner_id: LearnerId) -> Result<Vec<ReviewQueueEntry>>;

    /// Entry by id
    fn get_entry(&self, id: Uuid) -> Result<Option<ReviewQueueEntry>>;

    /// Insert or update an entry
    fn save_entry(&self, entry: &ReviewQueueEntry) -> Result<()>;

    /// Progress record for one item
    fn load_progress(&self, key: &ItemKey) -> Result<Option<StudyItemProgress>>;

    /// Every progress record of a learner
    fn load_learner_progress(&self, learner_id: LearnerId) -> Result<Vec<StudyItemProgress>>;

    /// Insert or update a progress record
    fn save_progress(&self, progress: &StudyItemProgress) -> Result<()>;

    /// Session by id, with its results attached
    fn get_session(&self, id: Uuid) -> Result<Option<ReviewSession>>;

    /// Insert or update a session's header and counters (results are ignored)
    fn save_session(&self, session: &ReviewSession) -> Result<()>;

    /// Append a graded result to its session
    fn save_result(&self, result: &ReviewResult) -> Result<()>;

    /// Results of a session in the order they were recorded
    fn load_results(&self, session_id: Uuid) -> Result<Vec<ReviewResult>>;

    /// Persist the outcome of a completed review
    ///
    /// Stores that support transactions should override this so the three
    /// writes land together.
    fn apply_completion(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) -> Result<()> {
        self.save_entry(completed)?;
        if let Some(next) = successor {
            self.save_entry(next)?;
        }
        self.save_progress(progress)
    }

    /// Persist a completion graded inside a session, with its result and
    /// the session's updated counters
    ///
    /// The default writes the session side first, so a failure there leaves
    /// the entry open and the answer can be recorded again. Stores that
    /// support transactions should override this so all writes land together.
    fn apply_graded_result(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
        result: &ReviewResult,
        session: &ReviewSession,
    ) -> Result<()> {
        self.save_result(result)?;
        self.save_session(session)?;
        self.apply_completion(completed, successor, progress)
    }
}

impl<S: ReviewStore + ?Sized> ReviewStore for std::sync::Arc<S> {
    fn load_entries(&self, learner_id: LearnerId) -> Result<Vec<ReviewQueueEntry>> {
        (**self).load_entries(learner_id)
    }

    fn get_entry(&self, id: Uuid) -> Result<Option<ReviewQueueEntry>> {
        (**self).get_entry(id)
    }

    fn save_entry(&self, entry: &ReviewQueueEntry) -> Result<()> {
        (**self).save_entry(entry)
    }

    fn load_progress(&self, key: &ItemKey) -> Result<Option<StudyItemProgress>> {
        (**self).load_progress(key)
    }

    fn load_learner_progress(&self, learner_id: LearnerId) -> Result<Vec<StudyItemProgress>> {
        (**self).load_learner_progress(learner_id)
    }

    fn save_progress(&self, progress: &StudyItemProgress) -> Result<()> {
        (**self).save_progress(progress)
    }

    fn get_session(&self, id: Uuid) -> Result<Option<ReviewSession>> {
        (**self).get_session(id)
    }

    fn save_session(&self, session: &ReviewSession) -> Result<()> {
        (**self).save_session(session)
    }

    fn save_result(&self, result: &ReviewResult) -> Result<()> {
        (**self).save_result(result)
    }

    fn load_results(&self, session_id: Uuid) -> Result<Vec<ReviewResult>> {
        (**self).load_results(session_id)
    }

    fn apply_completion(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) -> Result<()> {
        (**self).apply_completion(completed, successor, progress)
    }

    fn apply_graded_result(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
        result: &ReviewResult,
        session: &ReviewSession,
    ) -> Result<()> {
        (**self).apply_graded_result(completed, successor, progress, result, session)
    }
}
