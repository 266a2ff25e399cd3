//! In-memory store
//!
//! Everything lives in hash maps partitioned by learner. Nothing survives the
//! process; use [`super::SqliteStore`] for that.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Result, ReviewStore, StorageError};
use crate::item::{ItemKey, LearnerId, StudyItemProgress};
use crate::queue::ReviewQueueEntry;
use crate::session::{ReviewResult, ReviewSession};

#[derive(Debug, Default)]
struct Tables {
    /// learner -> entry id -> entry
    entries: HashMap<LearnerId, HashMap<Uuid, ReviewQueueEntry>>,
    /// entry id -> owning learner
    entry_owner: HashMap<Uuid, LearnerId>,
    /// learner -> progress records
    progress: HashMap<LearnerId, HashMap<ItemKey, StudyItemProgress>>,
    /// session headers (results kept separately)
    sessions: HashMap<Uuid, ReviewSession>,
    results: HashMap<Uuid, Vec<ReviewResult>>,
}

/// Hash-map backed [`ReviewStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Tables {
    fn write_completion(
        &mut self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) {
        for entry in std::iter::once(completed).chain(successor) {
            self.entry_owner.insert(entry.id, entry.learner_id());
            self.entries
                .entry(entry.learner_id())
                .or_default()
                .insert(entry.id, entry.clone());
        }
        self.progress
            .entry(progress.key.learner_id)
            .or_default()
            .insert(progress.key, progress.clone());
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory store"))
    }
}

impl ReviewStore for MemoryStore {
    fn load_entries(&self, learner_id: LearnerId) -> Result<Vec<ReviewQueueEntry>> {
        let tables = self.tables()?;
        Ok(tables
            .entries
            .get(&learner_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get_entry(&self, id: Uuid) -> Result<Option<ReviewQueueEntry>> {
        let tables = self.tables()?;
        let entry = tables
            .entry_owner
            .get(&id)
            .and_then(|learner| tables.entries.get(learner))
            .and_then(|m| m.get(&id))
            .cloned();
        Ok(entry)
    }

    fn save_entry(&self, entry: &ReviewQueueEntry) -> Result<()> {
        let mut tables = self.tables()?;
        tables.entry_owner.insert(entry.id, entry.learner_id());
        tables
            .entries
            .entry(entry.learner_id())
            .or_default()
            .insert(entry.id, entry.clone());
        Ok(())
    }

    fn load_progress(&self, key: &ItemKey) -> Result<Option<StudyItemProgress>> {
        let tables = self.tables()?;
        Ok(tables
            .progress
            .get(&key.learner_id)
            .and_then(|m| m.get(key))
            .cloned())
    }

    fn load_learner_progress(&self, learner_id: LearnerId) -> Result<Vec<StudyItemProgress>> {
        let tables = self.tables()?;
        let mut records: Vec<StudyItemProgress> = tables
            .progress
            .get(&learner_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by_key(|p| p.key);
        Ok(records)
    }

    fn save_progress(&self, progress: &StudyItemProgress) -> Result<()> {
        let mut tables = self.tables()?;
        tables
            .progress
            .entry(progress.key.learner_id)
            .or_default()
            .insert(progress.key, progress.clone());
        Ok(())
    }

    fn get_session(&self, id: Uuid) -> Result<Option<ReviewSession>> {
        let tables = self.tables()?;
        Ok(tables.sessions.get(&id).map(|header| {
            let mut session = header.clone();
            session.results = tables.results.get(&id).cloned().unwrap_or_default();
            session
        }))
    }

    fn save_session(&self, session: &ReviewSession) -> Result<()> {
        let mut tables = self.tables()?;
        let mut header = session.clone();
        header.results.clear();
        tables.sessions.insert(session.id, header);
        Ok(())
    }

    fn save_result(&self, result: &ReviewResult) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.sessions.contains_key(&result.session_id) {
            return Err(StorageError::Corrupt(format!(
                "result {} references unknown session {}",
                result.id, result.session_id
            )));
        }
        tables
            .results
            .entry(result.session_id)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    fn load_results(&self, session_id: Uuid) -> Result<Vec<ReviewResult>> {
        let tables = self.tables()?;
        Ok(tables.results.get(&session_id).cloned().unwrap_or_default())
    }

    fn apply_completion(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
    ) -> Result<()> {
        // Single lock acquisition so readers never see half a completion
        let mut tables = self.tables()?;
        tables.write_completion(completed, successor, progress);
        Ok(())
    }

    fn apply_graded_result(
        &self,
        completed: &ReviewQueueEntry,
        successor: Option<&ReviewQueueEntry>,
        progress: &StudyItemProgress,
        result: &ReviewResult,
        session: &ReviewSession,
    ) -> Result<()> {
        let mut tables = self.tables()?;
        // Validate before the first write so a rejection changes nothing
        if !tables.sessions.contains_key(&result.session_id) {
            return Err(StorageError::Corrupt(format!(
                "result {} references unknown session {}",
                result.id, result.session_id
            )));
        }
        tables.write_completion(completed, successor, progress);
        tables
            .results
            .entry(result.session_id)
            .or_default()
            .push(result.clone());
        let mut header = session.clone();
        header.results.clear();
        tables.sessions.insert(session.id, header);
        Ok(())
    }
}
