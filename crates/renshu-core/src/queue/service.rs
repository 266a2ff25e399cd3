//! Review queue operations
//!
//! The queue owns nothing but handles: entries and progress live in the
//! store. Writes for one learner are serialised by a per-learner lock so the
//! open-entry check in `enqueue` and the read-modify-write in `complete` are
//! atomic with respect to each other.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::entry::ReviewQueueEntry;
use super::stats::{QueueStats, StudyStatistics};
use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, Result};
use crate::item::{ItemId, ItemKey, ItemKind, LearnerId, StudyItemProgress};
use crate::srs::{add_days, Difficulty, Priority, SrsCalculator, SrsConfig};
use crate::storage::ReviewStore;

/// Delay applied when `enqueue` is not given a due time
pub const DEFAULT_SCHEDULE_DELAY_DAYS: i64 = 1;

/// Outcome of grading one entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// The entry as stored after completion
    pub entry: ReviewQueueEntry,
    pub new_level: u32,
    pub next_review_at: DateTime<Utc>,
    /// True when the item left the active queue
    pub mastered: bool,
    /// Follow-up entry, absent when mastered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successor: Option<ReviewQueueEntry>,
}

/// Scheduling front end over a [`ReviewStore`]
///
/// Per-learner lock handles are created on demand and dropped from the lock
/// table once no caller holds them, so the table only tracks learners with
/// a write in flight.
pub struct ReviewQueue<S: ReviewStore> {
    store: Arc<S>,
    calculator: SrsCalculator,
    clock: Arc<dyn Clock>,
    learner_locks: Mutex<HashMap<LearnerId, Arc<Mutex<()>>>>,
}

impl<S: ReviewStore> ReviewQueue<S> {
    pub fn new(store: Arc<S>, calculator: SrsCalculator, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            calculator,
            clock,
            learner_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the calculator from `config`, failing on an unusable table
    pub fn with_config(store: Arc<S>, config: SrsConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let calculator = SrsCalculator::new(config)?;
        Ok(Self::new(store, calculator, clock))
    }

    /// Default configuration and the wall clock
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, SrsCalculator::default(), Arc::new(SystemClock))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn calculator(&self) -> &SrsCalculator {
        &self.calculator
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ========================================================================
    // LOCKING
    // ========================================================================

    /// Lock handle for one learner, created on first use
    ///
    /// Handles nobody else holds are pruned here. Handing out a handle and
    /// pruning both happen under the table lock, so two callers for the same
    /// learner always share one mutex.
    pub(crate) fn learner_lock(&self, learner_id: LearnerId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .learner_locks
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner lock table"))?;
        locks.retain(|_, handle| Arc::strong_count(handle) > 1);
        Ok(locks.entry(learner_id).or_default().clone())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    fn open_entries(&self, learner_id: LearnerId) -> Result<Vec<ReviewQueueEntry>> {
        let mut entries = self.store.load_entries(learner_id)?;
        entries.retain(|e| !e.is_completed());
        Ok(entries)
    }

    /// Due, incomplete entries: most urgent band first, then oldest first
    pub fn due_entries(&self, learner_id: LearnerId, limit: usize) -> Result<Vec<ReviewQueueEntry>> {
        let now = self.now();
        let mut due: Vec<ReviewQueueEntry> = self
            .open_entries(learner_id)?
            .into_iter()
            .filter(|e| e.is_due(now))
            .collect();

        due.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.scheduled_at.cmp(&b.scheduled_at))
                .then(a.id.cmp(&b.id))
        });
        due.truncate(limit);
        Ok(due)
    }

    /// Incomplete entries due in `(now, now + within_days]`, soonest first
    ///
    /// A window reaching past the representable range covers everything
    /// scheduled after now; a non-positive window is empty.
    pub fn upcoming_entries(
        &self,
        learner_id: LearnerId,
        within_days: i64,
    ) -> Result<Vec<ReviewQueueEntry>> {
        if within_days <= 0 {
            return Ok(Vec::new());
        }
        let now = self.now();
        let horizon = add_days(now, within_days).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut upcoming: Vec<ReviewQueueEntry> = self
            .open_entries(learner_id)?
            .into_iter()
            .filter(|e| e.scheduled_at > now && e.scheduled_at <= horizon)
            .collect();

        upcoming.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        Ok(upcoming)
    }

    /// Incomplete entries in one priority band, soonest first
    pub fn entries_by_priority(
        &self,
        learner_id: LearnerId,
        priority: Priority,
    ) -> Result<Vec<ReviewQueueEntry>> {
        let mut entries: Vec<ReviewQueueEntry> = self
            .open_entries(learner_id)?
            .into_iter()
            .filter(|e| e.priority == priority)
            .collect();
        entries.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// Number of due entries, 0 if the store cannot be read
    pub fn due_count(&self, learner_id: LearnerId) -> usize {
        let now = self.now();
        match self.store.load_entries(learner_id) {
            Ok(entries) => entries.iter().filter(|e| e.is_due(now)).count(),
            Err(e) => {
                tracing::warn!(learner = learner_id, "due count unavailable: {}", e);
                0
            }
        }
    }

    /// Typed dashboard counts, zeroed if the store cannot be read
    pub fn stats(&self, learner_id: LearnerId) -> QueueStats {
        let now = self.now();
        match self.store.load_entries(learner_id) {
            Ok(entries) => QueueStats::from_entries(&entries, now),
            Err(e) => {
                tracing::warn!(learner = learner_id, "queue stats unavailable: {}", e);
                QueueStats::from_entries(std::iter::empty(), now)
            }
        }
    }

    /// Dashboard counts keyed `DueToday`, `Overdue`, `Upcoming`, `Due<Kind>`
    pub fn stats_by_category(&self, learner_id: LearnerId) -> BTreeMap<String, usize> {
        self.stats(learner_id).to_category_map()
    }

    /// Mastery record for one item
    pub fn progress(
        &self,
        learner_id: LearnerId,
        kind: ItemKind,
        item_id: ItemId,
    ) -> Result<Option<StudyItemProgress>> {
        Ok(self
            .store
            .load_progress(&ItemKey::new(learner_id, kind, item_id))?)
    }

    /// Per-kind totals, zeroed if the store cannot be read
    pub fn study_statistics(&self, learner_id: LearnerId) -> StudyStatistics {
        match self.store.load_learner_progress(learner_id) {
            Ok(records) => StudyStatistics::from_progress(&records),
            Err(e) => {
                tracing::warn!(learner = learner_id, "study statistics unavailable: {}", e);
                StudyStatistics::from_progress(std::iter::empty())
            }
        }
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Schedule an item, or reschedule its open entry
    ///
    /// At most one incomplete entry exists per item. A new entry snapshots
    /// the item's current level (0 on first exposure) with Low priority and
    /// is due at `scheduled_at`, or one day from now.
    pub fn enqueue(
        &self,
        learner_id: LearnerId,
        kind: ItemKind,
        item_id: ItemId,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<ReviewQueueEntry> {
        let lock = self.learner_lock(learner_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner"))?;

        let key = ItemKey::new(learner_id, kind, item_id);
        let now = self.now();

        let existing = self
            .store
            .load_entries(learner_id)?
            .into_iter()
            .find(|e| e.key == key && !e.is_completed());

        if let Some(mut entry) = existing {
            if let Some(at) = scheduled_at {
                entry.scheduled_at = at;
                self.store.save_entry(&entry)?;
            }
            tracing::debug!(learner = learner_id, entry = %entry.id, "enqueue kept open entry");
            return Ok(entry);
        }

        let due_at = scheduled_at.unwrap_or(now + Duration::days(DEFAULT_SCHEDULE_DELAY_DAYS));
        let progress = self.store.load_progress(&key)?;
        let level = progress.as_ref().map(|p| p.mastery_level).unwrap_or(0);

        let entry = ReviewQueueEntry::new(key, due_at, Priority::Low, level);
        self.store.save_entry(&entry)?;

        if progress.is_none() {
            self.store
                .save_progress(&StudyItemProgress::first_exposure(key, due_at, now))?;
        }

        tracing::debug!(
            learner = learner_id,
            entry = %entry.id,
            level,
            "enqueued {}",
            key
        );
        Ok(entry)
    }

    /// Grade an entry; false if it is missing or already completed
    pub fn complete(&self, entry_id: Uuid, was_correct: bool, difficulty: Difficulty) -> Result<bool> {
        Ok(self
            .complete_with_outcome(entry_id, was_correct, difficulty)?
            .is_some())
    }

    /// Grade an entry and report what happened
    ///
    /// Returns `None`, and changes nothing, if the entry is missing or
    /// already completed.
    pub fn complete_with_outcome(
        &self,
        entry_id: Uuid,
        was_correct: bool,
        difficulty: Difficulty,
    ) -> Result<Option<Completion>> {
        let Some(peek) = self.store.get_entry(entry_id)? else {
            tracing::warn!(entry = %entry_id, "complete: entry not found");
            return Ok(None);
        };

        let lock = self.learner_lock(peek.learner_id())?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner"))?;

        // Re-read under the lock; another caller may have completed it
        match self.store.get_entry(entry_id)? {
            Some(entry) if !entry.is_completed() => {
                Ok(Some(self.complete_locked(entry, was_correct, difficulty)?))
            }
            _ => {
                tracing::warn!(entry = %entry_id, "complete: entry already completed");
                Ok(None)
            }
        }
    }

    /// Completion body; caller holds the learner lock and has checked the
    /// entry is open
    pub(crate) fn complete_locked(
        &self,
        entry: ReviewQueueEntry,
        was_correct: bool,
        difficulty: Difficulty,
    ) -> Result<Completion> {
        let (completion, progress) = self.plan_completion(entry, was_correct, difficulty)?;
        self.store.apply_completion(
            &completion.entry,
            completion.successor.as_ref(),
            &progress,
        )?;
        Self::log_completion(&completion);
        Ok(completion)
    }

    /// Work out a completion without writing anything
    ///
    /// Returns the closed entry, its successor and the updated progress
    /// record. Caller holds the learner lock.
    pub(crate) fn plan_completion(
        &self,
        mut entry: ReviewQueueEntry,
        was_correct: bool,
        difficulty: Difficulty,
    ) -> Result<(Completion, StudyItemProgress)> {
        let now = self.now();
        let new_level = self
            .calculator
            .next_level(entry.mastery_level, was_correct, difficulty);
        let next_review_at =
            self.calculator
                .next_review_at(entry.mastery_level, was_correct, difficulty, now);

        let mut progress = match self.store.load_progress(&entry.key)? {
            Some(p) => p,
            None => StudyItemProgress::first_exposure(entry.key, entry.scheduled_at, now),
        };
        progress.record_review(was_correct, new_level, next_review_at, now);

        let outcome_retention = if was_correct { 100.0 } else { 0.0 };
        let mastered = self.calculator.is_mastered(new_level, outcome_retention);

        entry.completed_at = Some(now);
        let successor = (!mastered).then(|| {
            ReviewQueueEntry::new(
                entry.key,
                next_review_at,
                self.calculator.successor_priority(new_level, was_correct),
                new_level,
            )
        });

        let completion = Completion {
            entry,
            new_level,
            next_review_at,
            mastered,
            successor,
        };
        Ok((completion, progress))
    }

    pub(crate) fn log_completion(completion: &Completion) {
        tracing::debug!(
            learner = completion.entry.learner_id(),
            entry = %completion.entry.id,
            level = completion.new_level,
            mastered = completion.mastered,
            "completed review of {}",
            completion.entry.key
        );
    }

    /// Recompute open entries' priority from overdue-ness and retention
    ///
    /// Returns how many entries changed band.
    pub fn refresh_priorities(&self, learner_id: LearnerId) -> Result<usize> {
        let lock = self.learner_lock(learner_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner"))?;

        let now = self.now();
        let retention: HashMap<ItemKey, f64> = self
            .store
            .load_learner_progress(learner_id)?
            .into_iter()
            .map(|p| (p.key, p.retention_rate()))
            .collect();

        let mut changed = 0;
        for mut entry in self.open_entries(learner_id)? {
            let rate = retention.get(&entry.key).copied().unwrap_or(0.0);
            let priority =
                self.calculator
                    .priority(entry.scheduled_at, now, entry.mastery_level, rate);
            if priority != entry.priority {
                entry.priority = priority;
                self.store.save_entry(&entry)?;
                changed += 1;
            }
        }

        tracing::debug!(learner = learner_id, changed, "refreshed priorities");
        Ok(changed)
    }
}

// ============================================================================
// TESTS
// ============================================================================
