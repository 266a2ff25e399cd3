//! Persistence journey: state survives closing and reopening the database

use renshu_core::{Difficulty, ItemKind, Priority, ResultInput, ReviewStore};
use renshu_e2e_tests::TestEngine;

#[test]
fn test_queue_and_progress_survive_reopen() {
    let mut engine = TestEngine::new_temp();
    let entry = engine
        .queue
        .enqueue(3, ItemKind::Vocabulary, 12, Some(engine.now()))
        .unwrap();
    let outcome = engine
        .queue
        .complete_with_outcome(entry.id, false, Difficulty::Normal)
        .unwrap()
        .unwrap();
    let successor = outcome.successor.unwrap();

    engine.reopen();

    let stored = engine.store().get_entry(successor.id).unwrap().unwrap();
    assert_eq!(stored, successor);
    assert_eq!(stored.priority, Priority::Critical);

    let old = engine.store().get_entry(entry.id).unwrap().unwrap();
    assert_eq!(old.completed_at, Some(engine.now()));

    let progress = engine
        .queue
        .progress(3, ItemKind::Vocabulary, 12)
        .unwrap()
        .unwrap();
    assert_eq!(progress.incorrect_count, 1);
    assert_eq!(progress.next_review_at, successor.scheduled_at);

    // Dedup still holds against the persisted open entry
    let again = engine
        .queue
        .enqueue(3, ItemKind::Vocabulary, 12, None)
        .unwrap();
    assert_eq!(again.id, successor.id);
    assert_eq!(engine.open_entries_for(3, ItemKind::Vocabulary, 12), 1);
}

#[test]
fn test_session_survives_reopen() {
    let mut engine = TestEngine::new_temp();
    let first = engine
        .queue
        .enqueue(1, ItemKind::Kanji, 1, Some(engine.now()))
        .unwrap();
    let second = engine
        .queue
        .enqueue(1, ItemKind::Kanji, 2, Some(engine.now()))
        .unwrap();

    let session = engine.sessions.start(1).unwrap();
    engine
        .sessions
        .record_result(
            session.id,
            ResultInput::new(first.id, true).with_answers("yama", "yama"),
        )
        .unwrap();

    engine.reopen();

    // Keep going in the reopened engine
    engine
        .sessions
        .record_result(session.id, ResultInput::new(second.id, false).with_latency(4200))
        .unwrap();
    assert!(engine.sessions.end(session.id).unwrap());

    engine.reopen();
    let stored = engine.sessions.get(session.id).unwrap().unwrap();
    assert_eq!(stored.items_reviewed, 2);
    assert_eq!(stored.correct_answers, 1);
    assert!(stored.is_ended());
    assert_eq!(stored.results.len(), 2);
    assert_eq!(stored.results[0].user_answer, "yama");
    assert_eq!(stored.results[1].response_time_ms, 4200);
}

#[test]
fn test_backup_copy_is_readable() {
    let engine = TestEngine::new_temp();
    engine
        .queue
        .enqueue(9, ItemKind::Grammar, 77, None)
        .unwrap();

    let backup_dir = tempfile::tempdir().unwrap();
    let backup_path = backup_dir.path().join("backup.db");
    engine.store().backup_to(&backup_path).unwrap();

    let copy = renshu_core::SqliteStore::new(Some(backup_path)).unwrap();
    assert_eq!(copy.load_entries(9).unwrap().len(), 1);
    assert_eq!(copy.load_learner_progress(9).unwrap().len(), 1);
}
