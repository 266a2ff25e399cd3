//! Review queue entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{ItemId, ItemKey, ItemKind, LearnerId};
use crate::srs::Priority;

/// One scheduled review of one item
///
/// Entries are immutable once `completed_at` is set; a follow-up review is a
/// new entry with a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueEntry {
    /// Unique identifier (UUID v4)
    pub id: Uuid,
    pub key: ItemKey,
    /// When the review becomes due
    pub scheduled_at: DateTime<Utc>,
    /// Set once the review has been graded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    /// Mastery level when the entry was scheduled
    pub mastery_level: u32,
}

impl ReviewQueueEntry {
    /// Fresh, incomplete entry
    pub fn new(key: ItemKey, scheduled_at: DateTime<Utc>, priority: Priority, mastery_level: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            scheduled_at,
            completed_at: None,
            priority,
            mastery_level,
        }
    }

    #[inline]
    pub fn learner_id(&self) -> LearnerId {
        self.key.learner_id
    }

    #[inline]
    pub fn kind(&self) -> ItemKind {
        self.key.kind
    }

    #[inline]
    pub fn item_id(&self) -> ItemId {
        self.key.item_id
    }

    /// Check if the entry has been graded
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Due and not yet graded
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now && !self.is_completed()
    }

    /// Past its scheduled time and not yet graded
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.scheduled_at && !self.is_completed()
    }

    /// Whole days overdue, 0 when not overdue
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        if self.is_overdue(now) {
            (now - self.scheduled_at).num_days()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(scheduled_at: DateTime<Utc>) -> ReviewQueueEntry {
        ReviewQueueEntry::new(
            ItemKey::new(1, ItemKind::Vocabulary, 10),
            scheduled_at,
            Priority::Low,
            0,
        )
    }

    #[test]
    fn test_overdue_and_due() {
        let now = Utc::now();
        let e = entry(now - Duration::hours(50));
        assert!(e.is_due(now));
        assert!(e.is_overdue(now));
        assert_eq!(e.days_overdue(now), 2);

        let future = entry(now + Duration::hours(1));
        assert!(!future.is_due(now));
        assert!(!future.is_overdue(now));
        assert_eq!(future.days_overdue(now), 0);

        // Due exactly now: due, but not overdue
        let exact = entry(now);
        assert!(exact.is_due(now));
        assert!(!exact.is_overdue(now));
    }

    #[test]
    fn test_completed_is_never_due() {
        let now = Utc::now();
        let mut e = entry(now - Duration::days(10));
        e.completed_at = Some(now);
        assert!(e.is_completed());
        assert!(!e.is_due(now));
        assert!(!e.is_overdue(now));
        assert_eq!(e.days_overdue(now), 0);
    }

    #[test]
    fn test_json_shape() {
        let e = entry(Utc::now());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["key"]["kind"], "vocabulary");
        assert_eq!(json["priority"], "low");
        assert!(json.get("completedAt").is_none());
    }
}
