//! Review session records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::LearnerId;
use crate::srs::Difficulty;

/// A sitting in which a learner grades a run of queue entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSession {
    /// Unique identifier (UUID v4)
    pub id: Uuid,
    pub learner_id: LearnerId,
    pub started_at: DateTime<Utc>,
    /// Set when the learner stops; never cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub items_reviewed: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    /// Graded results in recording order
    #[serde(default)]
    pub results: Vec<ReviewResult>,
}

impl ReviewSession {
    /// Open session with zeroed counters
    pub fn new(learner_id: LearnerId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            learner_id,
            started_at,
            ended_at: None,
            items_reviewed: 0,
            correct_answers: 0,
            incorrect_answers: 0,
            results: Vec::new(),
        }
    }

    /// Check if the session has been closed
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Percent of correct answers, 0 with no items
    pub fn accuracy_rate(&self) -> f64 {
        if self.items_reviewed == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.items_reviewed as f64 * 100.0
        }
    }

    /// Elapsed time; open sessions are measured up to `now`
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.ended_at.unwrap_or(now) - self.started_at
    }

    /// Mean response latency over recorded results
    pub fn average_response_time_ms(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let total: u64 = self.results.iter().map(|r| r.response_time_ms as u64).sum();
        Some(total as f64 / self.results.len() as f64)
    }

    pub(crate) fn count(&mut self, is_correct: bool) {
        self.items_reviewed += 1;
        if is_correct {
            self.correct_answers += 1;
        } else {
            self.incorrect_answers += 1;
        }
    }
}

/// One graded answer inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Queue entry this answer resolved
    pub entry_id: Uuid,
    pub is_correct: bool,
    /// Response latency in milliseconds
    pub response_time_ms: u32,
    pub user_answer: String,
    pub correct_answer: String,
    pub difficulty: Difficulty,
    pub reviewed_at: DateTime<Utc>,
}

/// What the caller reports for one graded answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResultInput {
    pub entry_id: Uuid,
    pub is_correct: bool,
    #[serde(default)]
    pub response_time_ms: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default)]
    pub correct_answer: String,
}

impl ResultInput {
    /// Minimal input: entry and correctness, Normal difficulty
    pub fn new(entry_id: Uuid, is_correct: bool) -> Self {
        Self {
            entry_id,
            is_correct,
            response_time_ms: 0,
            difficulty: Difficulty::Normal,
            user_answer: String::new(),
            correct_answer: String::new(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_latency(mut self, response_time_ms: u32) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub fn with_answers(mut self, user_answer: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        self.user_answer = user_answer.into();
        self.correct_answer = correct_answer.into();
        self
    }
}
