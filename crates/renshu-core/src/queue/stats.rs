//! Read-only queue aggregates
//!
//! These never fail: missing data yields zero counts.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entry::ReviewQueueEntry;
use crate::item::{ItemKind, StudyItemProgress};

/// Window for the "upcoming" count
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Due/overdue/upcoming counts for one learner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Scheduled on or before today (UTC)
    pub due_today: usize,
    /// Scheduled before the start of today (UTC)
    pub overdue: usize,
    /// Scheduled within the next seven days
    pub upcoming: usize,
    /// Due now, by item kind
    pub due_by_kind: BTreeMap<ItemKind, usize>,
}

impl QueueStats {
    /// Aggregate a learner's entries as of `now`
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a ReviewQueueEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let today = now.date_naive();
        let start_of_today = today.and_time(NaiveTime::MIN).and_utc();
        let upcoming_end = now + Duration::days(UPCOMING_WINDOW_DAYS);

        let mut stats = QueueStats {
            due_by_kind: ItemKind::ALL.iter().map(|k| (*k, 0)).collect(),
            ..Default::default()
        };

        for entry in entries.into_iter().filter(|e| !e.is_completed()) {
            if entry.scheduled_at.date_naive() <= today {
                stats.due_today += 1;
            }
            if entry.scheduled_at < start_of_today {
                stats.overdue += 1;
            }
            if entry.scheduled_at > now && entry.scheduled_at <= upcoming_end {
                stats.upcoming += 1;
            }
            if entry.scheduled_at <= now {
                *stats.due_by_kind.entry(entry.kind()).or_default() += 1;
            }
        }

        stats
    }

    /// Flat string-keyed view for dashboards
    ///
    /// Keys: `DueToday`, `Overdue`, `Upcoming`, `DueKanji`, `DueVocabulary`,
    /// `DueGrammar`, `DueKana`.
    pub fn to_category_map(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        map.insert("DueToday".to_string(), self.due_today);
        map.insert("Overdue".to_string(), self.overdue);
        map.insert("Upcoming".to_string(), self.upcoming);
        for kind in ItemKind::ALL {
            let count = self.due_by_kind.get(&kind).copied().unwrap_or(0);
            map.insert(format!("Due{}", kind.label()), count);
        }
        map
    }
}

/// Total and learned counts for one item kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindProgress {
    /// Items the learner has been exposed to
    pub total: usize,
    /// Items above level 0
    pub learned: usize,
}

/// Per-kind study totals for one learner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStatistics {
    pub by_kind: BTreeMap<ItemKind, KindProgress>,
}

impl StudyStatistics {
    pub fn from_progress<'a>(records: impl IntoIterator<Item = &'a StudyItemProgress>) -> Self {
        let mut by_kind: BTreeMap<ItemKind, KindProgress> =
            ItemKind::ALL.iter().map(|k| (*k, KindProgress::default())).collect();

        for record in records {
            let slot = by_kind.entry(record.key.kind).or_default();
            slot.total += 1;
            if record.is_learned() {
                slot.learned += 1;
            }
        }

        Self { by_kind }
    }

    /// Counts for `kind`
    pub fn kind(&self, kind: ItemKind) -> KindProgress {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }

    /// Flat view: `TotalKanji`, `LearnedKanji`, ...
    pub fn to_category_map(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        for kind in ItemKind::ALL {
            let counts = self.kind(kind);
            map.insert(format!("Total{}", kind.label()), counts.total);
            map.insert(format!("Learned{}", kind.label()), counts.learned);
        }
        map
    }
}
