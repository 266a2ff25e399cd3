//! Session start / record / end

use std::sync::Arc;
use uuid::Uuid;

use super::model::{ResultInput, ReviewResult, ReviewSession};
use crate::error::{EngineError, Result};
use crate::item::LearnerId;
use crate::queue::ReviewQueue;
use crate::storage::ReviewStore;

/// Session operations over a shared [`ReviewQueue`]
pub struct ReviewSessions<S: ReviewStore> {
    queue: Arc<ReviewQueue<S>>,
}

impl<S: ReviewStore> Clone for ReviewSessions<S> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<S: ReviewStore> ReviewSessions<S> {
    pub fn new(queue: Arc<ReviewQueue<S>>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<ReviewQueue<S>> {
        &self.queue
    }

    fn load(&self, session_id: Uuid) -> Result<ReviewSession> {
        self.queue
            .store()
            .get_session(session_id)?
            .ok_or(EngineError::SessionNotFound(session_id))
    }

    /// Open and persist a session starting now
    pub fn start(&self, learner_id: LearnerId) -> Result<ReviewSession> {
        let session = ReviewSession::new(learner_id, self.queue.now());
        self.queue.store().save_session(&session)?;
        tracing::debug!(learner = learner_id, session = %session.id, "session started");
        Ok(session)
    }

    /// Grade an entry inside a session
    ///
    /// Completes the entry through the queue, appends the result and bumps
    /// the counters in one store write. Fails without recording anything if
    /// the session is missing or closed, if the entry is missing or already
    /// completed or owned by another learner, or if that write fails.
    pub fn record_result(&self, session_id: Uuid, input: ResultInput) -> Result<ReviewResult> {
        let learner_id = self.load(session_id)?.learner_id;

        let lock = self.queue.learner_lock(learner_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner"))?;

        let mut session = self.load(session_id)?;
        if session.is_ended() {
            return Err(EngineError::SessionAlreadyEnded(session_id));
        }

        let entry = match self.queue.store().get_entry(input.entry_id)? {
            Some(e) if e.learner_id() == learner_id && !e.is_completed() => e,
            _ => {
                tracing::warn!(session = %session_id, entry = %input.entry_id, "record: entry not found");
                return Err(EngineError::EntryNotFound(input.entry_id));
            }
        };

        let (completion, progress) =
            self.queue
                .plan_completion(entry, input.is_correct, input.difficulty)?;

        let result = ReviewResult {
            id: Uuid::new_v4(),
            session_id,
            entry_id: input.entry_id,
            is_correct: input.is_correct,
            response_time_ms: input.response_time_ms,
            user_answer: input.user_answer,
            correct_answer: input.correct_answer,
            difficulty: input.difficulty,
            reviewed_at: completion.entry.completed_at.unwrap_or_else(|| self.queue.now()),
        };
        session.count(result.is_correct);

        self.queue.store().apply_graded_result(
            &completion.entry,
            completion.successor.as_ref(),
            &progress,
            &result,
            &session,
        )?;
        ReviewQueue::<S>::log_completion(&completion);

        tracing::debug!(
            learner = learner_id,
            session = %session_id,
            entry = %result.entry_id,
            level = completion.new_level,
            "result recorded"
        );
        Ok(result)
    }

    /// Close a session
    ///
    /// `Ok(false)` if the session does not exist; `SessionAlreadyEnded` on a
    /// repeat call, leaving the session untouched.
    pub fn end(&self, session_id: Uuid) -> Result<bool> {
        let Some(found) = self.queue.store().get_session(session_id)? else {
            tracing::warn!(session = %session_id, "end: session not found");
            return Ok(false);
        };

        let lock = self.queue.learner_lock(found.learner_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::LockPoisoned("learner"))?;

        let mut session = self.load(session_id)?;
        if session.is_ended() {
            return Err(EngineError::SessionAlreadyEnded(session_id));
        }

        let now = self.queue.now();
        session.ended_at = Some(now);
        self.queue.store().save_session(&session)?;

        tracing::debug!(
            learner = session.learner_id,
            session = %session_id,
            items = session.items_reviewed,
            accuracy = session.accuracy_rate(),
            "session ended"
        );
        Ok(true)
    }

    /// Session with its results
    pub fn get(&self, session_id: Uuid) -> Result<Option<ReviewSession>> {
        Ok(self.queue.store().get_session(session_id)?)
    }

    /// Results of a session in recording order
    pub fn results(&self, session_id: Uuid) -> Result<Vec<ReviewResult>> {
        self.load(session_id)?;
        Ok(self.queue.store().load_results(session_id)?)
    }
}
