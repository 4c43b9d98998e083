//! Integration tests for the spatial reaction-time assessment.

use std::sync::Arc;

use quitkit_core::tasks::reaction::{ReactionConfig, ReactionSession, TARGET_RADIUS};
use quitkit_core::{Event, JsonHistoryStore, SeededStream, SessionStore};

/// Participant script for one target.
enum Plan {
    /// Tap the center after the given latency.
    Hit(u64),
    /// Never tap; let the target time out.
    Ignore,
}

fn run_session(session: &mut ReactionSession, plans: &[Plan]) {
    let mut next = 0;
    let mut now = 0u64;
    session.start(now);

    while !session.is_finished() && now < 1_000_000 {
        now += 10;
        let events = session.tick(now);
        if !events
            .iter()
            .any(|e| matches!(e, Event::ResponseWindowOpened { .. }))
        {
            continue;
        }
        let plan = &plans[next];
        next += 1;
        if let Plan::Hit(latency) = plan {
            let target = session.current_target().unwrap().clone();
            now += latency;
            let events = session.tap(target.x, target.y, now);
            assert!(
                matches!(events[0], Event::ResponseRecorded { correct: true, .. }),
                "center tap must hit"
            );
        }
    }
    assert!(session.is_finished(), "session never finished");
}

#[test]
fn mixed_session_aggregates_hits_misses_and_outliers() {
    let config = ReactionConfig {
        trials: 5,
        ..Default::default()
    };
    let mut session = ReactionSession::new(config, SeededStream::new(606));
    run_session(
        &mut session,
        &[
            Plan::Hit(300),
            Plan::Ignore,
            Plan::Hit(500),
            Plan::Hit(50), // sub-reflex: a hit, excluded from latency stats
            Plan::Hit(400),
        ],
    );

    let results = session.results();
    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.timed_out).count(), 1);

    let summary = session.summary().unwrap();
    assert_eq!(summary.total_trials, 5);
    assert_eq!(summary.correct, 4);
    assert_eq!(summary.accuracy, 0.8);
    // Only the in-window latencies feed the stats: 300, 500, 400.
    assert_eq!(summary.mean_rt_ms, Some(400.0));
    assert_eq!(summary.median_rt_ms, Some(400.0));
    assert_eq!(summary.interference_ms, None);
}

#[test]
fn targets_never_overlap_and_stay_in_the_inset_area() {
    let config = ReactionConfig {
        trials: 8,
        ..Default::default()
    };
    let mut session = ReactionSession::new(config, SeededStream::new(17));
    let mut presented = 0usize;
    let mut last_finish = 0u64;
    let mut now = 0u64;
    session.start(now);

    while !session.is_finished() && now < 1_000_000 {
        now += 10;
        for event in session.tick(now) {
            match event {
                Event::TrialPresented { at_ms, .. } => {
                    presented += 1;
                    // Each target appears only after the previous trial
                    // reached a terminal outcome.
                    assert!(at_ms >= last_finish);
                    let target = session.current_target().unwrap();
                    assert!(target.x >= TARGET_RADIUS);
                    assert!(target.x <= session.config().area_width - TARGET_RADIUS);
                    assert!(target.y >= TARGET_RADIUS);
                    assert!(target.y <= session.config().area_height - TARGET_RADIUS);
                    assert_eq!(target.shown_at_ms, Some(at_ms));
                }
                Event::TrialFinished { at_ms, .. } => last_finish = at_ms,
                _ => {}
            }
        }
    }
    // All targets timed out (no taps), one per trial.
    assert_eq!(presented, 8);
    assert_eq!(session.results().len(), 8);
    assert!(session.results().iter().all(|r| r.timed_out));
}

#[test]
fn summary_round_trips_through_the_history_store() {
    let config = ReactionConfig {
        trials: 3,
        ..Default::default()
    };
    let mut session = ReactionSession::new(config, SeededStream::new(9));
    run_session(&mut session, &[Plan::Hit(250), Plan::Hit(350), Plan::Hit(450)]);
    let summary = session.summary().unwrap();
    assert_eq!(summary.median_rt_ms, Some(350.0));

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonHistoryStore::at_path(
        dir.path().join("sessions-reaction.json"),
    ));
    store.append(&summary).unwrap();
    assert_eq!(store.list(), vec![summary.clone()]);

    // Appending again keeps most-recent-last ordering.
    let mut second = ReactionSession::new(
        ReactionConfig {
            trials: 3,
            ..Default::default()
        },
        SeededStream::new(10),
    );
    run_session(&mut second, &[Plan::Hit(200), Plan::Hit(200), Plan::Hit(200)]);
    let second_summary = second.summary().unwrap();
    store.append(&second_summary).unwrap();
    assert_eq!(store.list(), vec![summary, second_summary]);
}
