//! Per-item mastery record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemKey;
use crate::srs::retention_rate;

/// One learner's mastery of one study item
///
/// `mastery_level` and `next_review_at` are written only when a review is
/// completed through the queue; they always reflect the last transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItemProgress {
    pub key: ItemKey,
    /// Current rung on the interval ladder
    pub mastery_level: u32,
    /// When the item is next due
    pub next_review_at: DateTime<Utc>,
    /// Correct answers so far (never decreases)
    pub correct_count: u32,
    /// Incorrect answers so far (never decreases)
    pub incorrect_count: u32,
    /// None until the first completed review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// First exposure
    pub created_at: DateTime<Utc>,
}

impl StudyItemProgress {
    /// Record for a first exposure: level 0, due at `due_at`
    pub fn first_exposure(key: ItemKey, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            key,
            mastery_level: 0,
            next_review_at: due_at,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed_at: None,
            created_at: now,
        }
    }

    /// Total answers recorded
    pub fn total_reviews(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    /// Percent of correct answers (0.0 - 100.0), 0 with no history
    pub fn retention_rate(&self) -> f64 {
        retention_rate(self.correct_count, self.total_reviews())
    }

    /// Check if the item is due at `now`
    pub fn is_review_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Check if the learner has moved past level 0
    pub fn is_learned(&self) -> bool {
        self.mastery_level > 0
    }

    /// Apply a completed review
    pub(crate) fn record_review(
        &mut self,
        was_correct: bool,
        new_level: u32,
        next_review_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        if was_correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        self.mastery_level = new_level;
        self.next_review_at = next_review_at;
        self.last_reviewed_at = Some(now);
    }
}
