//! Test Engine Manager
//!
//! Provides isolated engine instances for testing:
//! - Temporary SQLite databases that are automatically cleaned up
//! - A manual clock pinned to a fixed start instant
//! - Reopening the same database to check persistence

use chrono::{DateTime, Duration, TimeZone, Utc};
use renshu_core::{
    ManualClock, ReviewQueue, ReviewSessions, ReviewStore, SqliteStore, SrsCalculator, SrsConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Start instant shared by every test engine (a Monday morning, UTC)
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

/// Manager for test engines
///
/// Each engine owns its own database file. The temporary directory is
/// deleted when the engine is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let engine = TestEngine::new_temp();
/// let entry = engine.queue.enqueue(1, ItemKind::Kanji, 7, Some(engine.now()))?;
/// engine.advance_days(3);
/// ```
pub struct TestEngine {
    pub queue: Arc<ReviewQueue<SqliteStore>>,
    pub sessions: ReviewSessions<SqliteStore>,
    pub clock: Arc<ManualClock>,
    config: SrsConfig,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    db_path: PathBuf,
}

impl TestEngine {
    /// Engine with the default interval table
    pub fn new_temp() -> Self {
        Self::new_temp_with_config(SrsConfig::default())
    }

    /// Engine with a custom interval table
    pub fn new_temp_with_config(config: SrsConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_renshu.db");
        let clock = Arc::new(ManualClock::new(epoch()));

        let (queue, sessions) = Self::build(&db_path, &config, &clock);

        Self {
            queue,
            sessions,
            clock,
            config,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    fn build(
        db_path: &PathBuf,
        config: &SrsConfig,
        clock: &Arc<ManualClock>,
    ) -> (Arc<ReviewQueue<SqliteStore>>, ReviewSessions<SqliteStore>) {
        let store = SqliteStore::new(Some(db_path.clone())).expect("Failed to create test store");
        let calculator = SrsCalculator::new(config.clone()).expect("Invalid test configuration");
        let queue = Arc::new(ReviewQueue::new(Arc::new(store), calculator, clock.clone()));
        let sessions = ReviewSessions::new(queue.clone());
        (queue, sessions)
    }

    /// Drop the open connections and open the same file again
    ///
    /// The clock keeps its current time.
    pub fn reopen(&mut self) {
        let (queue, sessions) = Self::build(&self.db_path, &self.config, &self.clock);
        self.queue = queue;
        self.sessions = sessions;
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn store(&self) -> &SqliteStore {
        self.queue.store()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.queue.now()
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(Duration::hours(hours));
    }

    /// Number of open entries a learner has for one item
    pub fn open_entries_for(
        &self,
        learner_id: i64,
        kind: renshu_core::ItemKind,
        item_id: i64,
    ) -> usize {
        self.store()
            .load_entries(learner_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.kind() == kind && e.item_id() == item_id && !e.is_completed())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Total entries (open and completed) of a learner
    pub fn entry_count(&self, learner_id: i64) -> usize {
        self.store()
            .load_entries(learner_id)
            .map(|e| e.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renshu_core::ItemKind;

    #[test]
    fn test_temp_engine_starts_at_epoch() {
        let engine = TestEngine::new_temp();
        assert_eq!(engine.now(), epoch());
        assert!(engine.path().exists());
    }

    #[test]
    fn test_reopen_keeps_data_and_time() {
        let mut engine = TestEngine::new_temp();
        engine.queue.enqueue(1, ItemKind::Kanji, 1, None).unwrap();
        engine.advance_hours(5);

        engine.reopen();
        assert_eq!(engine.entry_count(1), 1);
        assert_eq!(engine.now(), epoch() + Duration::hours(5));
    }
}
