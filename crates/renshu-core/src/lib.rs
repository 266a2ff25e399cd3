//! # Renshu Core
//!
//! Spaced-repetition review engine for language study items (kanji,
//! vocabulary, grammar patterns, kana).
//!
//! - **Level ladder**: configurable table of retention intervals indexed by mastery level
//! - **SRS Calculator**: pure transitions from (level, correctness, difficulty) to the next level, due time and priority
//! - **Review Queue**: per-learner scheduled entries with at most one open entry per item
//! - **Review Sessions**: batches of graded answers with accuracy and timing
//! - **Storage**: in-memory and SQLite stores behind one trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use renshu_core::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! let queue = Arc::new(ReviewQueue::with_defaults(store));
//!
//! queue.enqueue(1, ItemKind::Kanji, 42, None)?;
//! for entry in queue.due_entries(1, 20)? {
//!     queue.complete(entry.id, true, Difficulty::Normal)?;
//! }
//!
//! let sessions = ReviewSessions::new(queue.clone());
//! let session = sessions.start(1)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `encryption`: SQLCipher, keyed from `RENSHU_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod error;
pub mod item;
pub mod queue;
pub mod session;
pub mod srs;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, Result};

pub use item::{ItemId, ItemKey, ItemKind, LearnerId, StudyItemProgress};

pub use srs::{
    format_interval, retention_rate, ConfigError, Difficulty, IntervalTable, MasteryLabel,
    Priority, SrsCalculator, SrsConfig, SrsStats,
};

pub use queue::{
    Completion, KindProgress, QueueStats, ReviewQueue, ReviewQueueEntry, StudyStatistics,
};

pub use session::{ResultInput, ReviewResult, ReviewSession, ReviewSessions};

pub use storage::{MemoryStore, ReviewStore, SqliteStore, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Clock, Completion, Difficulty, EngineError, ItemKind, MemoryStore, Priority, Result,
        ResultInput, ReviewQueue, ReviewQueueEntry, ReviewSession, ReviewSessions, ReviewStore,
        SqliteStore, SrsCalculator, SrsConfig, StudyItemProgress, SystemClock,
    };
}
