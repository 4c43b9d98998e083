//! Mental-arithmetic sequence task.
//!
//! Each trial presents a start value and then reveals a chain of signed
//! operations one at a time; the participant tracks the running total
//! and enters the final value. Generated chains keep every intermediate
//! value inside `[0, 99]` so the task stays mental-arithmetic, never
//! bookkeeping of negatives or carries.

use serde::{Deserialize, Serialize};

use crate::engine::{SessionEngine, TrialRecord, TrialTimings};
use crate::events::Event;
use crate::rng::SeededStream;
use crate::scoring::{summarize, AssessmentMode, SessionSummary, TrialSample};

/// Lowest and highest value the running total may ever take.
pub const VALUE_MIN: i32 = 0;
pub const VALUE_MAX: i32 = 99;

/// Bounded generation attempts before the fixed fallback is used.
const MAX_ATTEMPTS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

/// One signed step in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub sign: Sign,
    pub value: u8,
}

impl Op {
    pub fn apply(&self, value: i32) -> i32 {
        match self.sign {
            Sign::Plus => value + i32::from(self.value),
            Sign::Minus => value - i32::from(self.value),
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = match self.sign {
            Sign::Plus => '+',
            Sign::Minus => '-',
        };
        write!(f, "{sign}{}", self.value)
    }
}

/// A start value plus its operation chain and precomputed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub start: i32,
    pub ops: Vec<Op>,
    pub result: i32,
}

impl Sequence {
    /// The deterministic sequence returned when generation exhausts its
    /// attempt budget: `10 +3 -2 +4 -1 = 14`.
    pub fn fallback() -> Self {
        let ops = vec![
            Op { sign: Sign::Plus, value: 3 },
            Op { sign: Sign::Minus, value: 2 },
            Op { sign: Sign::Plus, value: 4 },
            Op { sign: Sign::Minus, value: 1 },
        ];
        let result = ops.iter().fold(10, |v, op| op.apply(v));
        Sequence { start: 10, ops, result }
    }

    /// Running values including the start and the final result.
    pub fn running_values(&self) -> Vec<i32> {
        let mut values = Vec::with_capacity(self.ops.len() + 1);
        let mut v = self.start;
        values.push(v);
        for op in &self.ops {
            v = op.apply(v);
            values.push(v);
        }
        values
    }

    /// True when every running value lies in `[VALUE_MIN, VALUE_MAX]`
    /// and the stored result matches the chain.
    pub fn is_consistent(&self) -> bool {
        let values = self.running_values();
        values.iter().all(|v| (VALUE_MIN..=VALUE_MAX).contains(v))
            && values.last() == Some(&self.result)
    }
}

/// Per-level generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyParams {
    /// Inclusive range of operations per sequence.
    pub ops: (usize, usize),
    /// Inclusive per-step magnitude range.
    pub magnitude: (u8, u8),
    /// Inclusive start-value range.
    pub start: (i32, i32),
}

/// Fixed lookup table for levels 1..=10.
const LEVELS: [DifficultyParams; 10] = [
    DifficultyParams { ops: (2, 3), magnitude: (1, 5), start: (10, 40) },
    DifficultyParams { ops: (3, 4), magnitude: (1, 6), start: (10, 40) },
    DifficultyParams { ops: (3, 4), magnitude: (2, 8), start: (10, 45) },
    DifficultyParams { ops: (4, 5), magnitude: (2, 10), start: (10, 50) },
    DifficultyParams { ops: (4, 5), magnitude: (3, 12), start: (15, 55) },
    DifficultyParams { ops: (5, 6), magnitude: (3, 15), start: (15, 60) },
    DifficultyParams { ops: (5, 7), magnitude: (4, 18), start: (20, 60) },
    DifficultyParams { ops: (6, 8), magnitude: (5, 20), start: (20, 65) },
    DifficultyParams { ops: (6, 8), magnitude: (5, 24), start: (25, 70) },
    DifficultyParams { ops: (8, 10), magnitude: (6, 28), start: (30, 70) },
];

impl DifficultyParams {
    /// Table row for a level; out-of-range levels clamp to 1..=10.
    pub fn for_level(level: u8) -> Self {
        let idx = level.clamp(1, 10) as usize - 1;
        LEVELS[idx]
    }
}

/// Bounded retry-with-fallback sequence generator.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    params: DifficultyParams,
}

impl SequenceBuilder {
    pub fn new(params: DifficultyParams) -> Self {
        Self { params }
    }

    pub fn for_level(level: u8) -> Self {
        Self::new(DifficultyParams::for_level(level))
    }

    /// Generate one sequence. Falls back to [`Sequence::fallback`] when
    /// every attempt fails; never errors.
    pub fn build(&self, stream: &mut SeededStream) -> Sequence {
        for _ in 0..MAX_ATTEMPTS {
            if let Some(seq) = self.attempt(stream) {
                return seq;
            }
        }
        Sequence::fallback()
    }

    /// One generation attempt. A step with no legal operator discards
    /// the whole attempt rather than salvaging a shorter chain.
    fn attempt(&self, stream: &mut SeededStream) -> Option<Sequence> {
        let (start_min, start_max) = self.params.start;
        let (ops_min, ops_max) = self.params.ops;
        let (mag_min, mag_max) = self.params.magnitude;

        let start = stream.range_u64(start_min as u64, start_max as u64) as i32;
        let target_ops = stream.range_u64(ops_min as u64, ops_max as u64) as usize;

        let mut value = start;
        let mut ops = Vec::with_capacity(target_ops);
        for _ in 0..target_ops {
            // Legality is judged against the maximum magnitude, so any
            // magnitude in range keeps the running value in bounds.
            let plus_legal = value + i32::from(mag_max) <= VALUE_MAX;
            let minus_legal = value - i32::from(mag_max) >= VALUE_MIN;
            let sign = match (plus_legal, minus_legal) {
                (true, true) => {
                    if stream.chance(0.5) {
                        Sign::Plus
                    } else {
                        Sign::Minus
                    }
                }
                (true, false) => Sign::Plus,
                (false, true) => Sign::Minus,
                (false, false) => return None,
            };
            let magnitude = stream.range_u64(u64::from(mag_min), u64::from(mag_max)) as u8;
            let op = Op { sign, value: magnitude };
            value = op.apply(value);
            ops.push(op);
        }
        Some(Sequence { start, ops, result: value })
    }
}

/// Task settings, also embedded in the application config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default = "default_countdown_from")]
    pub countdown_from: u8,
}

fn default_trials() -> usize {
    5
}
fn default_level() -> u8 {
    3
}
fn default_countdown_from() -> u8 {
    3
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            level: default_level(),
            countdown_from: default_countdown_from(),
        }
    }
}

/// Per-operation reveal interval for a level: slower at low levels,
/// floored at 900ms.
pub fn reveal_interval_ms(level: u8) -> u64 {
    let level = u64::from(level.clamp(1, 10));
    (1500 - level * 60).max(900)
}

/// A full arithmetic session: prepared sequences plus the phase engine.
#[derive(Debug)]
pub struct ArithmeticSession {
    config: ArithmeticConfig,
    seed: i64,
    sequences: Vec<Sequence>,
    engine: SessionEngine<Sequence>,
}

impl ArithmeticSession {
    pub fn new(config: ArithmeticConfig, mut stream: SeededStream) -> Self {
        let seed = stream.seed();
        let builder = SequenceBuilder::for_level(config.level);
        let sequences: Vec<Sequence> = (0..config.trials).map(|_| builder.build(&mut stream)).collect();
        let engine = SessionEngine::new(
            AssessmentMode::Arithmetic,
            sequences.len(),
            config.countdown_from,
        );
        Self {
            config,
            seed,
            sequences,
            engine,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn config(&self) -> &ArithmeticConfig {
        &self.config
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.start(now_ms);
        self.pump(events, now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.tick(now_ms);
        self.pump(events, now_ms)
    }

    /// Submit the final-value answer for the live sequence. The answer
    /// window is untimed; input outside it is ignored.
    pub fn respond(&mut self, answer: i32, now_ms: u64) -> Vec<Event> {
        let Some(sequence) = self.engine.current_trial() else {
            return Vec::new();
        };
        let correct = answer == sequence.result;
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

    pub fn results(&self) -> &[TrialRecord<Sequence>] {
        self.engine.results()
    }

    pub fn current_sequence(&self) -> Option<&Sequence> {
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
                latency_ms: r.reaction_time_ms.map(|ms| ms as f64),
                congruent: None,
                lure: false,
            })
            .collect();
        Some(summarize(AssessmentMode::Arithmetic, &samples))
    }

    /// Reveal schedule for one sequence: hold on the start value for two
    /// intervals, reveal each operation on the interval, then hold half
    /// again before the answer window opens.
    fn timings_for(&self, sequence: &Sequence) -> TrialTimings {
        let reveal = reveal_interval_ms(self.config.level);
        let steps = sequence.ops.len() as u64;
        TrialTimings {
            lead_in_ms: reveal * 2,
            reveal_offsets_ms: (1..=steps).map(|i| i * reveal).collect(),
            response_open_offset_ms: steps * reveal + reveal * 3 / 2,
            response_timeout_ms: None,
            feedback_ms: reveal,
        }
    }

    fn pump(&mut self, mut events: Vec<Event>, now_ms: u64) -> Vec<Event> {
        let mut i = 0;
        while i < events.len() {
            if let Event::TrialRequested { index, .. } = events[i] {
                let sequence = self.sequences[index].clone();
                let timings = self.timings_for(&sequence);
                let more = self.engine.begin_trial(sequence, timings, now_ms);
                events.extend(more);
                let more = self.engine.tick(now_ms);
                events.extend(more);
            }
            i += 1;
        }
        events
    }
}
