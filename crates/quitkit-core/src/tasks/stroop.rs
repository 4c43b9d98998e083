//! Color-word interference task.
//!
//! A fixed-length sequence of trials shows a word rendered in an ink
//! color. Depending on the mode the participant names the ink color or
//! the word itself. Roughly half the trials are congruent (word and ink
//! match); in ink-naming mode a quarter of the trials swap the color
//! word for a smoking-related lure word, which measures attentional
//! bias toward the habit rather than color interference.

use serde::{Deserialize, Serialize};

use crate::engine::{SessionEngine, TrialRecord, TrialTimings};
use crate::events::Event;
use crate::rng::SeededStream;
use crate::scoring::{summarize, AssessmentMode, SessionSummary, TrialSample};

/// Ink palette. Every palette color has a matching color word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
    ];

    /// The color word shown on screen for this palette entry.
    pub fn word(&self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Blue => "BLUE",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
            Color::Purple => "PURPLE",
            Color::Orange => "ORANGE",
        }
    }
}

/// Habit-related words substituted for color words on lure trials.
pub const LURE_WORDS: [&str; 8] = [
    "CIGARETTE", "SMOKE", "LIGHTER", "ASHTRAY", "NICOTINE", "CRAVING", "PUFF", "TOBACCO",
];

/// What the participant is asked to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StroopMode {
    /// Name the ink color, ignoring the word. Lure words permitted.
    NameInk,
    /// Name the word, ignoring the ink. Lure words never shown.
    NameWord,
}

/// The displayed word: either a palette color word or a lure word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum StroopWord {
    Color(Color),
    Lure(&'static str),
}

impl StroopWord {
    pub fn text(&self) -> &'static str {
        match self {
            StroopWord::Color(c) => c.word(),
            StroopWord::Lure(w) => w,
        }
    }
}

/// One prepared trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StroopTrial {
    pub id: usize,
    pub ink: Color,
    pub word: StroopWord,
    /// The color answer that counts as correct for the session's mode.
    pub target: Color,
    /// `None` on lure trials: a lure word has no color mapping to agree
    /// or disagree with.
    pub congruent: Option<bool>,
    pub lure: bool,
}

/// Task settings, also embedded in the application config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StroopConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_mode")]
    pub mode: StroopMode,
    /// Permit lure-word substitution (effective in ink-naming mode only).
    #[serde(default = "default_true")]
    pub lure_words: bool,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_feedback_ms")]
    pub feedback_ms: u64,
    #[serde(default = "default_countdown_from")]
    pub countdown_from: u8,
}

fn default_trials() -> usize {
    30
}
fn default_mode() -> StroopMode {
    StroopMode::NameInk
}
fn default_true() -> bool {
    true
}
fn default_response_timeout_ms() -> u64 {
    3000
}
fn default_feedback_ms() -> u64 {
    500
}
fn default_countdown_from() -> u8 {
    3
}

impl Default for StroopConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            mode: default_mode(),
            lure_words: true,
            response_timeout_ms: default_response_timeout_ms(),
            feedback_ms: default_feedback_ms(),
            countdown_from: default_countdown_from(),
        }
    }
}

/// Deterministic trial-sequence builder. Always yields exactly
/// `config.trials` trials for a given stream.
#[derive(Debug, Clone)]
pub struct StroopTrialBuilder {
    config: StroopConfig,
}

impl StroopTrialBuilder {
    pub fn new(config: StroopConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, stream: &mut SeededStream) -> Vec<StroopTrial> {
        (0..self.config.trials).map(|id| self.build_one(id, stream)).collect()
    }

    fn build_one(&self, id: usize, stream: &mut SeededStream) -> StroopTrial {
        let ink = Color::ALL[stream.index(Color::ALL.len())];
        let congruent = stream.chance(0.5);

        let lure_allowed = self.config.lure_words && self.config.mode == StroopMode::NameInk;
        if lure_allowed && stream.chance(0.25) {
            let word = StroopWord::Lure(LURE_WORDS[stream.index(LURE_WORDS.len())]);
            return StroopTrial {
                id,
                ink,
                word,
                target: ink,
                congruent: None,
                lure: true,
            };
        }

        let word_color = if congruent {
            ink
        } else {
            // Up to 10 rejection draws for a word that differs from the
            // ink; the last draw is accepted regardless, so a trial
            // labeled incongruent can in rare cases still match.
            let mut drawn = ink;
            for _ in 0..10 {
                drawn = Color::ALL[stream.index(Color::ALL.len())];
                if drawn != ink {
                    break;
                }
            }
            drawn
        };

        let target = match self.config.mode {
            StroopMode::NameInk => ink,
            StroopMode::NameWord => word_color,
        };
        StroopTrial {
            id,
            ink,
            word: StroopWord::Color(word_color),
            target,
            congruent: Some(congruent),
            lure: false,
        }
    }
}

/// A full color-word session: prepared trials plus the phase engine.
#[derive(Debug)]
pub struct StroopSession {
    config: StroopConfig,
    seed: i64,
    trials: Vec<StroopTrial>,
    engine: SessionEngine<StroopTrial>,
}

impl StroopSession {
    pub fn new(config: StroopConfig, mut stream: SeededStream) -> Self {
        let seed = stream.seed();
        let trials = StroopTrialBuilder::new(config.clone()).build(&mut stream);
        let engine = SessionEngine::new(AssessmentMode::Stroop, trials.len(), config.countdown_from);
        Self {
            config,
            seed,
            trials,
            engine,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn config(&self) -> &StroopConfig {
        &self.config
    }

    pub fn trials(&self) -> &[StroopTrial] {
        &self.trials
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.start(now_ms);
        self.pump(events, now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.tick(now_ms);
        self.pump(events, now_ms)
    }

    /// Answer the live trial with a color. Ignored outside the response
    /// window.
    pub fn respond(&mut self, answer: Color, now_ms: u64) -> Vec<Event> {
        let Some(trial) = self.engine.current_trial() else {
            return Vec::new();
        };
        let correct = answer == trial.target;
        self.engine.respond(correct, now_ms)
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

    pub fn results(&self) -> &[TrialRecord<StroopTrial>] {
        self.engine.results()
    }

    pub fn current_trial(&self) -> Option<&StroopTrial> {
        self.engine.current_trial()
    }

    /// Aggregate once the session is finished; `None` mid-session or
    /// after an abort.
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
                latency_ms: r.reaction_time_ms.map(|ms| ms as f64),
                congruent: r.trial.congruent,
                lure: r.trial.lure,
            })
            .collect();
        Some(summarize(AssessmentMode::Stroop, &samples))
    }

    fn pump(&mut self, mut events: Vec<Event>, now_ms: u64) -> Vec<Event> {
        let mut i = 0;
        while i < events.len() {
            if let Event::TrialRequested { index, .. } = events[i] {
                let trial = self.trials[index].clone();
                let timings = TrialTimings::immediate(
                    Some(self.config.response_timeout_ms),
                    self.config.feedback_ms,
                );
                let more = self.engine.begin_trial(trial, timings, now_ms);
                events.extend(more);
                let more = self.engine.tick(now_ms);
                events.extend(more);
            }
            i += 1;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(config: StroopConfig, seed: i64) -> Vec<StroopTrial> {
        StroopTrialBuilder::new(config).build(&mut SeededStream::new(seed))
    }

    #[test]
    fn yields_exactly_n_trials() {
        for n in [0, 1, 30, 100] {
            let config = StroopConfig {
                trials: n,
                ..Default::default()
            };
            assert_eq!(build(config, 42).len(), n);
        }
    }

    #[test]
    fn same_seed_same_trials() {
        let a = build(StroopConfig::default(), 7);
        let b = build(StroopConfig::default(), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn ids_are_sequential() {
        let trials = build(StroopConfig::default(), 3);
        for (i, t) in trials.iter().enumerate() {
            assert_eq!(t.id, i);
        }
    }

    #[test]
    fn lure_trials_have_no_congruency_and_target_the_ink() {
        let config = StroopConfig {
            trials: 400,
            ..Default::default()
        };
        let trials = build(config, 11);
        let lures: Vec<_> = trials.iter().filter(|t| t.lure).collect();
        assert!(!lures.is_empty());
        for t in &lures {
            assert_eq!(t.congruent, None);
            assert_eq!(t.target, t.ink);
            assert!(matches!(t.word, StroopWord::Lure(_)));
        }
    }

    #[test]
    fn word_naming_mode_never_shows_lures() {
        let config = StroopConfig {
            trials: 400,
            mode: StroopMode::NameWord,
            lure_words: true,
            ..Default::default()
        };
        assert!(build(config, 11).iter().all(|t| !t.lure));
    }

    #[test]
    fn congruent_trials_match_word_and_ink() {
        let trials = build(
            StroopConfig {
                trials: 400,
                ..Default::default()
            },
            5,
        );
        for t in trials.iter().filter(|t| t.congruent == Some(true)) {
            assert_eq!(t.word, StroopWord::Color(t.ink));
        }
    }

    #[test]
    fn incongruent_trials_rarely_if_ever_match() {
        // The 10-draw rejection loop accepts its last draw, so a match
        // is possible but vanishingly unlikely.
        let trials = build(
            StroopConfig {
                trials: 500,
                ..Default::default()
            },
            5,
        );
        let matching = trials
            .iter()
            .filter(|t| t.congruent == Some(false) && t.word == StroopWord::Color(t.ink))
            .count();
        assert!(matching <= 1, "matching: {matching}");
    }

    #[test]
    fn congruency_is_roughly_balanced() {
        let trials = build(
            StroopConfig {
                trials: 2000,
                ..Default::default()
            },
            123,
        );
        let colored: Vec<_> = trials.iter().filter(|t| !t.lure).collect();
        let congruent = colored.iter().filter(|t| t.congruent == Some(true)).count();
        let fraction = congruent as f64 / colored.len() as f64;
        assert!((0.4..=0.6).contains(&fraction), "fraction: {fraction}");
    }

    #[test]
    fn lure_rate_is_roughly_a_quarter() {
        let trials = build(
            StroopConfig {
                trials: 2000,
                ..Default::default()
            },
            321,
        );
        let lures = trials.iter().filter(|t| t.lure).count();
        let fraction = lures as f64 / trials.len() as f64;
        assert!((0.18..=0.32).contains(&fraction), "fraction: {fraction}");
    }

    #[test]
    fn target_follows_mode() {
        let ink_trials = build(
            StroopConfig {
                trials: 200,
                ..Default::default()
            },
            9,
        );
        for t in ink_trials.iter().filter(|t| !t.lure) {
            assert_eq!(t.target, t.ink);
        }

        let word_trials = build(
            StroopConfig {
                trials: 200,
                mode: StroopMode::NameWord,
                ..Default::default()
            },
            9,
        );
        for t in &word_trials {
            match t.word {
                StroopWord::Color(c) => assert_eq!(t.target, c),
                StroopWord::Lure(_) => panic!("lure in word-naming mode"),
            }
        }
    }

    #[test]
    fn session_classifies_against_the_target() {
        let config = StroopConfig {
            trials: 1,
            countdown_from: 0,
            ..Default::default()
        };
        let mut session = StroopSession::new(config, SeededStream::new(42));
        session.start(0);
        let target = session.current_trial().unwrap().target;
        let events = session.respond(target, 300);
        assert!(matches!(
            events[0],
            Event::ResponseRecorded { correct: true, .. }
        ));
    }
}
