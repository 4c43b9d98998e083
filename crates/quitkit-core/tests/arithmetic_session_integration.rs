//! Integration tests for the arithmetic sequence assessment.

use std::sync::Arc;

use quitkit_core::tasks::arithmetic::{ArithmeticConfig, ArithmeticSession, Sequence};
use quitkit_core::{Event, JsonHistoryStore, SeededStream, SessionStore};

/// Run a full session, answering correctly except on `wrong_index`.
fn run_session(session: &mut ArithmeticSession, wrong_index: usize) -> usize {
    let mut expected_correct = 0;
    let mut answered = 0;
    let mut now = 0u64;
    session.start(now);

    while !session.is_finished() && now < 2_000_000 {
        now += 50;
        let events = session.tick(now);
        if !events
            .iter()
            .any(|e| matches!(e, Event::ResponseWindowOpened { .. }))
        {
            continue;
        }
        let sequence = session.current_sequence().unwrap().clone();
        let answer = if answered == wrong_index {
            sequence.result + 1
        } else {
            expected_correct += 1;
            sequence.result
        };
        answered += 1;
        now += 2000;
        session.respond(answer, now);
    }
    assert!(session.is_finished(), "session never finished");
    expected_correct
}

#[test]
fn full_session_tracks_final_answers() {
    let config = ArithmeticConfig {
        trials: 4,
        level: 4,
        countdown_from: 3,
    };
    let mut session = ArithmeticSession::new(config, SeededStream::new(314));
    let expected_correct = run_session(&mut session, 2);

    let results = session.results();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| !r.timed_out), "answers are untimed");

    let summary = session.summary().unwrap();
    assert_eq!(summary.total_trials, 4);
    assert_eq!(summary.correct, expected_correct);
    assert_eq!(summary.correct, 3);
    assert_eq!(summary.mean_rt_ms, Some(2000.0));
    // No congruency structure outside the color-word task.
    assert_eq!(summary.interference_ms, None);
    assert_eq!(summary.bias_ms, None);
}

#[test]
fn every_presented_sequence_is_consistent() {
    for seed in [1, 99, 4242] {
        for level in [1, 5, 10] {
            let config = ArithmeticConfig {
                trials: 6,
                level,
                countdown_from: 0,
            };
            let session = ArithmeticSession::new(config, SeededStream::new(seed));
            for sequence in session.sequences() {
                assert!(sequence.is_consistent(), "seed {seed} level {level}: {sequence:?}");
            }
        }
    }
}

#[test]
fn same_seed_replays_the_same_sequences() {
    let config = ArithmeticConfig::default();
    let a = ArithmeticSession::new(config.clone(), SeededStream::new(55));
    let b = ArithmeticSession::new(config, SeededStream::new(55));
    assert_eq!(a.sequences(), b.sequences());
}

#[test]
fn fallback_sequence_is_the_documented_one() {
    let fallback = Sequence::fallback();
    assert_eq!(fallback.result, 14);
    assert_eq!(
        fallback.ops.iter().map(|op| op.to_string()).collect::<Vec<_>>(),
        vec!["+3", "-2", "+4", "-1"]
    );
}

#[test]
fn summary_round_trips_through_the_history_store() {
    let config = ArithmeticConfig {
        trials: 2,
        level: 2,
        countdown_from: 0,
    };
    let mut session = ArithmeticSession::new(config, SeededStream::new(8));
    run_session(&mut session, usize::MAX);
    let summary = session.summary().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonHistoryStore::at_path(
        dir.path().join("sessions-arithmetic.json"),
    ));
    store.append(&summary).unwrap();
    assert_eq!(store.list(), vec![summary]);
}
