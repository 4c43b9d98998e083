//! Spatial reaction-time task.
//!
//! One target at a time appears at a random position after a random
//! delay; the participant taps it as fast as possible. A tap counts
//! only within the target radius, and only reaction times inside a
//! plausibility window feed the latency statistics -- sub-reflex and
//! stale taps would otherwise skew the headline median.

use serde::{Deserialize, Serialize};

use crate::engine::{SessionEngine, TrialRecord, TrialTimings};
use crate::events::Event;
use crate::rng::SeededStream;
use crate::scoring::{summarize, AssessmentMode, SessionSummary, TrialSample};

/// Tap-to-center distance that still counts as a hit, in points.
pub const TARGET_RADIUS: f64 = 36.0;

/// Appearance delay range, inclusive.
pub const APPEAR_DELAY_MS: (u64, u64) = (300, 1500);

/// Response window per target.
pub const TARGET_TIMEOUT_MS: u64 = 2200;

/// Inter-trial cooldown.
pub const FEEDBACK_MS: u64 = 400;

/// Reaction times outside this window are excluded from latency
/// statistics (hits still count toward the tally).
pub const RT_STATS_WINDOW_MS: (u64, u64) = (120, 2000);

/// The tappable rectangle, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f64,
    pub height: f64,
}

impl PlayArea {
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// A single on-screen target. Transient: at most one is live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Stamped when the target actually becomes visible.
    pub shown_at_ms: Option<u64>,
}

impl Target {
    /// True when a tap at `(x, y)` lands within the target radius.
    pub fn is_hit(&self, x: f64, y: f64) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= TARGET_RADIUS * TARGET_RADIUS
    }
}

/// Draws the appearance delay and position for each target.
#[derive(Debug, Clone)]
pub struct ReactionTargetScheduler {
    area: PlayArea,
}

impl ReactionTargetScheduler {
    pub fn new(area: PlayArea) -> Self {
        Self { area }
    }

    /// Schedule the next target: a delay in [`APPEAR_DELAY_MS`] and a
    /// position uniform within the area inset by the target radius,
    /// falling back to the center when the area is too small to inset.
    pub fn schedule(&self, id: usize, stream: &mut SeededStream) -> (Target, u64) {
        let delay_ms = stream.range_u64(APPEAR_DELAY_MS.0, APPEAR_DELAY_MS.1);
        let (x, y) = if self.area.width < TARGET_RADIUS * 2.0 || self.area.height < TARGET_RADIUS * 2.0
        {
            self.area.center()
        } else {
            (
                stream.range_f64(TARGET_RADIUS, self.area.width - TARGET_RADIUS),
                stream.range_f64(TARGET_RADIUS, self.area.height - TARGET_RADIUS),
            )
        };
        (
            Target {
                id,
                x,
                y,
                shown_at_ms: None,
            },
            delay_ms,
        )
    }
}

/// Task settings, also embedded in the application config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_area_width")]
    pub area_width: f64,
    #[serde(default = "default_area_height")]
    pub area_height: f64,
}

fn default_trials() -> usize {
    12
}
fn default_area_width() -> f64 {
    320.0
}
fn default_area_height() -> f64 {
    480.0
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            area_width: default_area_width(),
            area_height: default_area_height(),
        }
    }
}

/// A full reaction session. Targets are drawn per trial rather than up
/// front; the randomized appearance delay is the lead-in the engine
/// arms, so no two targets ever overlap their response windows.
#[derive(Debug)]
pub struct ReactionSession {
    config: ReactionConfig,
    seed: i64,
    stream: SeededStream,
    scheduler: ReactionTargetScheduler,
    engine: SessionEngine<Target>,
}

impl ReactionSession {
    pub fn new(config: ReactionConfig, stream: SeededStream) -> Self {
        let seed = stream.seed();
        let scheduler = ReactionTargetScheduler::new(PlayArea {
            width: config.area_width,
            height: config.area_height,
        });
        // The random lead-in already builds anticipation, so the
        // session starts without a countdown.
        let engine = SessionEngine::new(AssessmentMode::Reaction, config.trials, 0);
        Self {
            config,
            seed,
            stream,
            scheduler,
            engine,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn config(&self) -> &ReactionConfig {
        &self.config
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.start(now_ms);
        self.pump(events, now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.tick(now_ms);
        self.pump(events, now_ms)
    }

    /// A tap anywhere in the play area. Taps outside the target radius
    /// (or outside the response window) do not end the trial.
    pub fn tap(&mut self, x: f64, y: f64, now_ms: u64) -> Vec<Event> {
        if !self.engine.phase().accepts_response() {
            return Vec::new();
        }
        let Some(target) = self.engine.current_trial() else {
            return Vec::new();
        };
        if !target.is_hit(x, y) {
            return Vec::new();
        }
        self.engine.respond(true, now_ms)
    }

    pub fn abort(&mut self, now_ms: u64) -> Vec<Event> {
        self.engine.abort(now_ms)
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn was_aborted(&self) -> bool {
        self.engine.was_aborted()
    }

    pub fn progress(&self) -> (usize, usize) {
        self.engine.progress()
    }

    pub fn results(&self) -> &[TrialRecord<Target>] {
        self.engine.results()
    }

    pub fn current_target(&self) -> Option<&Target> {
        self.engine.current_trial()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        if !self.engine.is_finished() {
            return None;
        }
        let samples: Vec<TrialSample> = self
            .engine
            .results()
            .iter()
            .map(|r| TrialSample {
                correct: r.correct,
                latency_ms: r
                    .reaction_time_ms
                    .filter(|rt| (RT_STATS_WINDOW_MS.0..=RT_STATS_WINDOW_MS.1).contains(rt))
                    .map(|rt| rt as f64),
                congruent: None,
                lure: false,
            })
            .collect();
        Some(summarize(AssessmentMode::Reaction, &samples))
    }

    fn pump(&mut self, mut events: Vec<Event>, now_ms: u64) -> Vec<Event> {
        let mut i = 0;
        while i < events.len() {
            match events[i] {
                Event::TrialRequested { index, .. } => {
                    let (target, delay_ms) = self.scheduler.schedule(index, &mut self.stream);
                    let timings =
                        TrialTimings::delayed(delay_ms, Some(TARGET_TIMEOUT_MS), FEEDBACK_MS);
                    let more = self.engine.begin_trial(target, timings, now_ms);
                    events.extend(more);
                    let more = self.engine.tick(now_ms);
                    events.extend(more);
                }
                Event::TrialPresented { at_ms, .. } => {
                    if let Some(target) = self.engine.current_trial_mut() {
                        target.shown_at_ms = Some(at_ms);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(trials: usize, seed: i64) -> ReactionSession {
        ReactionSession::new(
            ReactionConfig {
                trials,
                ..Default::default()
            },
            SeededStream::new(seed),
        )
    }

    /// Tick in 10ms steps until the response window opens; returns the
    /// clock at that point.
    fn open_window(session: &mut ReactionSession, mut now: u64) -> u64 {
        loop {
            now += 10;
            let events = session.tick(now);
            if events
                .iter()
                .any(|e| matches!(e, Event::ResponseWindowOpened { .. }))
            {
                return now;
            }
            assert!(now < 60_000, "window never opened");
        }
    }

    #[test]
    fn center_tap_is_always_a_hit() {
        let target = Target {
            id: 0,
            x: 100.0,
            y: 100.0,
            shown_at_ms: None,
        };
        assert!(target.is_hit(100.0, 100.0));
    }

    #[test]
    fn radius_boundary_is_exact() {
        let target = Target {
            id: 0,
            x: 100.0,
            y: 100.0,
            shown_at_ms: None,
        };
        assert!(target.is_hit(136.0, 100.0));
        assert!(!target.is_hit(137.0, 100.0));
    }

    #[test]
    fn scheduled_targets_respect_the_inset_area() {
        let scheduler = ReactionTargetScheduler::new(PlayArea {
            width: 320.0,
            height: 480.0,
        });
        let mut stream = SeededStream::new(8);
        for id in 0..500 {
            let (target, delay) = scheduler.schedule(id, &mut stream);
            assert!((APPEAR_DELAY_MS.0..=APPEAR_DELAY_MS.1).contains(&delay));
            assert!(target.x >= TARGET_RADIUS && target.x <= 320.0 - TARGET_RADIUS);
            assert!(target.y >= TARGET_RADIUS && target.y <= 480.0 - TARGET_RADIUS);
        }
    }

    #[test]
    fn tiny_area_falls_back_to_center() {
        let scheduler = ReactionTargetScheduler::new(PlayArea {
            width: 50.0,
            height: 50.0,
        });
        let (target, _) = scheduler.schedule(0, &mut SeededStream::new(1));
        assert_eq!((target.x, target.y), (25.0, 25.0));
    }

    #[test]
    fn hit_ends_the_trial_and_records_latency() {
        let mut s = session(1, 42);
        s.start(0);
        let opened = open_window(&mut s, 0);
        let target = s.current_target().unwrap();
        assert_eq!(target.shown_at_ms, Some(opened));
        let (x, y) = (target.x, target.y);

        let events = s.tap(x, y, opened + 350);
        assert!(matches!(
            events[0],
            Event::ResponseRecorded { correct: true, reaction_time_ms: 350, .. }
        ));

        s.tick(opened + 350 + FEEDBACK_MS);
        assert!(s.is_finished());
        let summary = s.summary().unwrap();
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.mean_rt_ms, Some(350.0));
        assert_eq!(summary.median_rt_ms, Some(350.0));
    }

    #[test]
    fn missed_taps_do_not_end_the_trial() {
        let mut s = session(1, 42);
        s.start(0);
        let opened = open_window(&mut s, 0);
        let target = s.current_target().unwrap();
        let (x, y) = (target.x, target.y);

        // 37 points off-center: outside the radius, trial stays live.
        assert!(s.tap(x + 37.0, y, opened + 100).is_empty());
        let events = s.tap(x, y, opened + 400);
        assert!(matches!(events[0], Event::ResponseRecorded { .. }));
    }

    #[test]
    fn timeout_records_a_miss() {
        let mut s = session(1, 7);
        s.start(0);
        let opened = open_window(&mut s, 0);

        let events = s.tick(opened + TARGET_TIMEOUT_MS);
        assert!(events.iter().any(|e| matches!(e, Event::TrialTimedOut { .. })));
        s.tick(opened + TARGET_TIMEOUT_MS + FEEDBACK_MS);

        let summary = s.summary().unwrap();
        assert_eq!(summary.total_trials, 1);
        assert_eq!(summary.correct, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.mean_rt_ms, None);
    }

    #[test]
    fn sub_reflex_hits_count_but_do_not_enter_latency_stats() {
        let mut s = session(1, 13);
        s.start(0);
        let opened = open_window(&mut s, 0);
        let target = s.current_target().unwrap();
        let (x, y) = (target.x, target.y);

        // 50ms is faster than any human reflex: a hit, but not a datum.
        s.tap(x, y, opened + 50);
        s.tick(opened + 50 + FEEDBACK_MS);

        let summary = s.summary().unwrap();
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.accuracy, 1.0);
        assert_eq!(summary.mean_rt_ms, None);
        assert_eq!(summary.median_rt_ms, None);
    }

    #[test]
    fn only_one_target_is_live_at_a_time() {
        let mut s = session(3, 99);
        s.start(0);
        let opened = open_window(&mut s, 0);
        let target = s.current_target().unwrap().clone();
        s.tap(target.x, target.y, opened + 300);

        // During the feedback cooldown taps are inert: no double record.
        let results_before = s.results().len();
        assert!(s.tap(target.x, target.y, opened + 310).is_empty());
        assert_eq!(s.results().len(), results_before);
    }
}
