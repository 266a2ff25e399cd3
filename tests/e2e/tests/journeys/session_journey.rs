//! Session journey: a learner sits down, grades the due queue, stops

use chrono::Duration;
use renshu_core::{Difficulty, EngineError, ItemKind, ResultInput};
use renshu_e2e_tests::{TestDataFactory, TestEngine};

#[test]
fn test_grade_whole_due_queue_in_one_session() {
    let engine = TestEngine::new_temp();
    TestDataFactory::create_mixed_kind_scenario(&engine.queue, 7, engine.now());

    let session = engine.sessions.start(7).unwrap();
    let due = engine.queue.due_entries(7, 50).unwrap();
    assert_eq!(due.len(), 4);

    for (i, entry) in due.iter().enumerate() {
        engine.clock.advance(Duration::seconds(15));
        let correct = entry.kind() != ItemKind::Grammar;
        let input = ResultInput::new(entry.id, correct)
            .with_latency(1000 + i as u32 * 500)
            .with_answers("answer", if correct { "answer" } else { "other" });
        engine.sessions.record_result(session.id, input).unwrap();
    }

    engine.clock.advance(Duration::minutes(2));
    assert!(engine.sessions.end(session.id).unwrap());

    let stored = engine.sessions.get(session.id).unwrap().unwrap();
    assert_eq!(stored.items_reviewed, 4);
    assert_eq!(stored.correct_answers, 3);
    assert_eq!(stored.incorrect_answers, 1);
    assert!((stored.accuracy_rate() - 75.0).abs() < 1e-9);
    assert_eq!(stored.duration(engine.now()), Duration::seconds(60) + Duration::minutes(2));
    assert_eq!(stored.average_response_time_ms(), Some(1750.0));

    let entry_ids: Vec<_> = stored.results.iter().map(|r| r.entry_id).collect();
    let due_ids: Vec<_> = due.iter().map(|e| e.id).collect();
    assert_eq!(entry_ids, due_ids);

    // Queue emptied; the wrong grammar answer is back tomorrow as critical
    assert_eq!(engine.queue.due_count(7), 0);
    engine.advance_days(1);
    let again = engine.queue.due_entries(7, 10).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].kind(), ItemKind::Grammar);
}

#[test]
fn test_session_errors_leave_state_alone() {
    let engine = TestEngine::new_temp();
    let entry = engine
        .queue
        .enqueue(1, ItemKind::Kanji, 1, Some(engine.now()))
        .unwrap();
    let session = engine.sessions.start(1).unwrap();

    assert!(matches!(
        engine
            .sessions
            .record_result(uuid::Uuid::new_v4(), ResultInput::new(entry.id, true)),
        Err(EngineError::SessionNotFound(_))
    ));
    assert!(matches!(
        engine
            .sessions
            .record_result(session.id, ResultInput::new(uuid::Uuid::new_v4(), true)),
        Err(EngineError::EntryNotFound(_))
    ));
    assert_eq!(engine.queue.due_count(1), 1);
    assert_eq!(engine.sessions.results(session.id).unwrap().len(), 0);

    assert!(engine.sessions.end(session.id).unwrap());
    assert!(matches!(
        engine.sessions.end(session.id),
        Err(EngineError::SessionAlreadyEnded(_))
    ));
    assert!(matches!(
        engine.sessions.record_result(
            session.id,
            ResultInput::new(entry.id, true).with_difficulty(Difficulty::Easy)
        ),
        Err(EngineError::SessionAlreadyEnded(_))
    ));

    let stored = engine.sessions.get(session.id).unwrap().unwrap();
    assert_eq!(stored.items_reviewed, 0);
    assert_eq!(stored.ended_at, Some(session.started_at));
    assert_eq!(engine.queue.due_count(1), 1);
}

#[test]
fn test_sessions_of_two_learners_do_not_mix() {
    let engine = TestEngine::new_temp();
    let a = engine
        .queue
        .enqueue(1, ItemKind::Kana, 1, Some(engine.now()))
        .unwrap();
    let b = engine
        .queue
        .enqueue(2, ItemKind::Kana, 1, Some(engine.now()))
        .unwrap();

    let s1 = engine.sessions.start(1).unwrap();
    let s2 = engine.sessions.start(2).unwrap();

    // Learner 1's session cannot grade learner 2's entry
    assert!(matches!(
        engine.sessions.record_result(s1.id, ResultInput::new(b.id, true)),
        Err(EngineError::EntryNotFound(_))
    ));

    engine
        .sessions
        .record_result(s1.id, ResultInput::new(a.id, true))
        .unwrap();
    engine
        .sessions
        .record_result(s2.id, ResultInput::new(b.id, false))
        .unwrap();

    let p1 = engine.queue.progress(1, ItemKind::Kana, 1).unwrap().unwrap();
    let p2 = engine.queue.progress(2, ItemKind::Kana, 1).unwrap().unwrap();
    assert_eq!((p1.correct_count, p1.incorrect_count), (1, 0));
    assert_eq!((p2.correct_count, p2.incorrect_count), (0, 1));
}
