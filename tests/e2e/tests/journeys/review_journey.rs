//! Review journey: enqueue, grade, climb the ladder, leave the queue

use chrono::Duration;
use renshu_core::{Difficulty, ItemKind, Priority, SrsConfig};
use renshu_e2e_tests::harness::epoch;
use renshu_e2e_tests::{DeckConfig, TestDataFactory, TestEngine};

#[test]
fn test_first_review_climbs_one_rung() {
    let engine = TestEngine::new_temp();
    let entry = engine
        .queue
        .enqueue(1, ItemKind::Kanji, 42, Some(engine.now()))
        .unwrap();

    let outcome = engine
        .queue
        .complete_with_outcome(entry.id, true, Difficulty::Normal)
        .unwrap()
        .unwrap();

    let successor = outcome.successor.unwrap();
    assert_eq!(successor.mastery_level, 1);
    assert_eq!(successor.priority, Priority::High);
    assert_eq!(successor.scheduled_at, epoch() + Duration::days(3));
    assert_eq!(engine.open_entries_for(1, ItemKind::Kanji, 42), 1);
}

#[test]
fn test_ladder_until_mastered() {
    let engine = TestEngine::new_temp();
    engine
        .queue
        .enqueue(1, ItemKind::Vocabulary, 9, Some(engine.now()))
        .unwrap();

    // Normal answers: levels 1, 2, ... until level 6 with perfect retention
    let mut reviews = 0;
    loop {
        let due = engine.queue.due_entries(1, 10).unwrap();
        assert_eq!(due.len(), 1, "exactly one open entry per item");
        let outcome = engine
            .queue
            .complete_with_outcome(due[0].id, true, Difficulty::Normal)
            .unwrap()
            .unwrap();
        reviews += 1;

        if outcome.mastered {
            assert_eq!(outcome.new_level, 6);
            break;
        }
        engine.clock.set(outcome.next_review_at);
        assert!(reviews < 10);
    }

    assert_eq!(reviews, 6);
    let progress = engine
        .queue
        .progress(1, ItemKind::Vocabulary, 9)
        .unwrap()
        .unwrap();
    assert_eq!(progress.mastery_level, 6);
    assert_eq!(progress.correct_count, 6);
    assert_eq!(progress.incorrect_count, 0);

    // Gone for good
    engine.advance_days(3650);
    assert_eq!(engine.queue.due_count(1), 0);
    assert_eq!(engine.open_entries_for(1, ItemKind::Vocabulary, 9), 0);
}

#[test]
fn test_wrong_answer_is_critical_and_drops_two_levels() {
    let engine = TestEngine::new_temp();
    engine
        .queue
        .enqueue(1, ItemKind::Grammar, 3, Some(engine.now()))
        .unwrap();

    // Easy twice: 0 -> 2 -> 4
    for _ in 0..2 {
        let due = engine.queue.due_entries(1, 1).unwrap();
        let outcome = engine
            .queue
            .complete_with_outcome(due[0].id, true, Difficulty::Easy)
            .unwrap()
            .unwrap();
        engine.clock.set(outcome.next_review_at);
    }

    let due = engine.queue.due_entries(1, 1).unwrap();
    assert_eq!(due[0].mastery_level, 4);
    let now = engine.now();
    let outcome = engine
        .queue
        .complete_with_outcome(due[0].id, false, Difficulty::Normal)
        .unwrap()
        .unwrap();

    let successor = outcome.successor.unwrap();
    assert_eq!(successor.mastery_level, 2);
    assert_eq!(successor.priority, Priority::Critical);
    assert_eq!(successor.scheduled_at, now + Duration::days(7));
}

#[test]
fn test_easy_answers_reach_mastery_early() {
    let engine =
        TestEngine::new_temp_with_config(SrsConfig::with_intervals(vec![1, 3, 7, 14, 30, 90, 180, 365, 730]));
    engine
        .queue
        .enqueue(1, ItemKind::Kana, 1, Some(engine.now()))
        .unwrap();

    // Easy: 0 -> 2 -> 4 -> 6, mastered on the third review
    let mut last = None;
    for _ in 0..3 {
        let due = engine.queue.due_entries(1, 1).unwrap();
        let outcome = engine
            .queue
            .complete_with_outcome(due[0].id, true, Difficulty::Easy)
            .unwrap()
            .unwrap();
        engine.clock.set(outcome.next_review_at);
        last = Some(outcome);
    }
    let last = last.unwrap();
    assert!(last.mastered);
    assert!(last.successor.is_none());
}

#[test]
fn test_due_queue_orders_by_urgency() {
    let engine = TestEngine::new_temp();
    let scenario = TestDataFactory::create_overdue_scenario(&engine.queue, 1, engine.now());
    assert_eq!(scenario.entries.len(), 6);

    assert_eq!(engine.queue.refresh_priorities(1).unwrap(), 6);

    let due = engine.queue.due_entries(1, 10).unwrap();
    let bands: Vec<Priority> = due.iter().map(|e| e.priority).collect();
    // 10d overdue, 5d overdue, 1h overdue, due now (never reviewed: High)
    assert_eq!(
        bands,
        vec![Priority::Critical, Priority::High, Priority::High, Priority::Medium]
    );
    assert_eq!(due[0].id, scenario.entries[0].id);
    assert_eq!(due[1].id, scenario.entries[1].id);
    assert_eq!(due[2].id, scenario.entries[3].id);

    let upcoming = engine.queue.upcoming_entries(1, 7).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, scenario.entries[4].id);
}

#[test]
fn test_dashboard_counts() {
    let engine = TestEngine::new_temp();
    TestDataFactory::create_mixed_kind_scenario(&engine.queue, 1, engine.now());
    TestDataFactory::create_deck(
        &engine.queue,
        DeckConfig {
            kanji: 4,
            first_item_id: 1000,
            ..Default::default()
        },
    );

    let stats = engine.queue.stats_by_category(1);
    assert_eq!(stats["DueToday"], 4);
    assert_eq!(stats["Overdue"], 0);
    assert_eq!(stats["Upcoming"], 4);
    assert_eq!(stats["DueKanji"], 1);
    assert_eq!(stats["DueKana"], 1);

    let study = engine.queue.study_statistics(1);
    assert_eq!(study.kind(ItemKind::Kanji).total, 5);
    assert_eq!(study.kind(ItemKind::Kanji).learned, 0);
}

#[test]
fn test_double_completion_changes_nothing() {
    let engine = TestEngine::new_temp();
    let entry = engine
        .queue
        .enqueue(1, ItemKind::Kanji, 5, Some(engine.now()))
        .unwrap();
    assert!(engine.queue.complete(entry.id, true, Difficulty::Normal).unwrap());

    let count_before = engine.entry_count(1);
    let stats_before = engine.queue.stats_by_category(1);
    assert!(!engine.queue.complete(entry.id, false, Difficulty::Hard).unwrap());
    assert!(!engine.queue.complete(uuid::Uuid::new_v4(), true, Difficulty::Normal).unwrap());
    assert_eq!(engine.entry_count(1), count_before);
    assert_eq!(engine.queue.stats_by_category(1), stats_before);
}
