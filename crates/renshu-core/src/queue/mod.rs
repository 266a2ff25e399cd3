//! Review Queue Module
//!
//! Per-learner scheduled reviews:
//! - Entries with a priority band and a due time
//! - Enqueue with at most one open entry per item
//! - Completion that grades, reschedules and updates progress together
//! - Read-only aggregates for dashboards

mod entry;
mod service;
mod stats;

pub use entry::ReviewQueueEntry;
pub use service::{Completion, ReviewQueue, DEFAULT_SCHEDULE_DELAY_DAYS};
pub use stats::{KindProgress, QueueStats, StudyStatistics, UPCOMING_WINDOW_DAYS};
