//! Test Data Factory
//!
//! Provides utilities for populating review queues:
//! - Decks of study items across kinds
//! - Pre-built scheduling scenarios

use chrono::{DateTime, Duration, Utc};
use renshu_core::{ItemKind, LearnerId, ReviewQueue, ReviewQueueEntry, ReviewStore};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let deck = TestDataFactory::create_deck(&queue, DeckConfig { kanji: 5, ..Default::default() });
/// let scenario = TestDataFactory::create_overdue_scenario(&queue, 1, now);
/// ```
pub struct TestDataFactory;

/// Configuration for deck generation
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub learner_id: LearnerId,
    pub kanji: usize,
    pub vocabulary: usize,
    pub grammar: usize,
    pub kana: usize,
    /// Item ids are assigned from here upward, per kind
    pub first_item_id: i64,
    /// Due time for every item; None uses the queue default (one day out)
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            learner_id: 1,
            kanji: 0,
            vocabulary: 0,
            grammar: 0,
            kana: 0,
            first_item_id: 1,
            scheduled_at: None,
        }
    }
}

impl DeckConfig {
    fn count(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::Kanji => self.kanji,
            ItemKind::Vocabulary => self.vocabulary,
            ItemKind::Grammar => self.grammar,
            ItemKind::Kana => self.kana,
        }
    }
}

/// A pre-built test scenario
#[derive(Debug)]
pub struct TestScenario {
    pub learner_id: LearnerId,
    /// Entries in creation order
    pub entries: Vec<ReviewQueueEntry>,
    pub description: String,
}

impl TestDataFactory {
    /// Enqueue a deck of items
    pub fn create_deck<S: ReviewStore>(
        queue: &ReviewQueue<S>,
        config: DeckConfig,
    ) -> Vec<ReviewQueueEntry> {
        let mut entries = Vec::new();
        for kind in ItemKind::ALL {
            for offset in 0..config.count(kind) {
                let item_id = config.first_item_id + offset as i64;
                if let Ok(entry) =
                    queue.enqueue(config.learner_id, kind, item_id, config.scheduled_at)
                {
                    entries.push(entry);
                }
            }
        }
        entries
    }

    /// Items at increasing distances from `now`
    ///
    /// In order: 10 days overdue, 5 days overdue, 1 hour overdue, due exactly
    /// now, due in 2 days, due in 10 days.
    pub fn create_overdue_scenario<S: ReviewStore>(
        queue: &ReviewQueue<S>,
        learner_id: LearnerId,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let offsets = [
            -Duration::days(10),
            -Duration::days(5),
            -Duration::hours(1),
            Duration::zero(),
            Duration::days(2),
            Duration::days(10),
        ];

        let entries = offsets
            .iter()
            .enumerate()
            .filter_map(|(i, offset)| {
                queue
                    .enqueue(learner_id, ItemKind::Vocabulary, 100 + i as i64, Some(now + *offset))
                    .ok()
            })
            .collect();

        TestScenario {
            learner_id,
            entries,
            description: "Vocabulary at graded overdue distances".to_string(),
        }
    }

    /// One due item of each kind, all scheduled at `now`
    pub fn create_mixed_kind_scenario<S: ReviewStore>(
        queue: &ReviewQueue<S>,
        learner_id: LearnerId,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let entries = TestDataFactory::create_deck(
            queue,
            DeckConfig {
                learner_id,
                kanji: 1,
                vocabulary: 1,
                grammar: 1,
                kana: 1,
                first_item_id: 500,
                scheduled_at: Some(now),
            },
        );

        TestScenario {
            learner_id,
            entries,
            description: "One due item per kind".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use renshu_core::{ManualClock, MemoryStore, SrsCalculator};
    use std::sync::Arc;

    fn create_test_queue() -> ReviewQueue<MemoryStore> {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
        ReviewQueue::new(
            Arc::new(MemoryStore::new()),
            SrsCalculator::default(),
            Arc::new(ManualClock::new(start)),
        )
    }

    #[test]
    fn test_create_deck() {
        let queue = create_test_queue();
        let deck = TestDataFactory::create_deck(
            &queue,
            DeckConfig {
                kanji: 3,
                grammar: 2,
                ..Default::default()
            },
        );
        assert_eq!(deck.len(), 5);
        assert_eq!(deck.iter().filter(|e| e.kind() == ItemKind::Grammar).count(), 2);
    }

    #[test]
    fn test_create_overdue_scenario() {
        let queue = create_test_queue();
        let now = queue.now();
        let scenario = TestDataFactory::create_overdue_scenario(&queue, 2, now);
        assert_eq!(scenario.entries.len(), 6);
        assert_eq!(queue.due_count(2), 4);
    }
}
