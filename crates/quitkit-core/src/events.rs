use serde::{Deserialize, Serialize};

use crate::scoring::AssessmentMode;

/// Every externally observable engine state change produces an Event.
/// The CLI prints them; a GUI shell renders from them.
///
/// Timestamps are engine-clock milliseconds (the `now_ms` the caller
/// passed in), not wall-clock time, so event logs from simulated and
/// real sessions line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        mode: AssessmentMode,
        trial_count: usize,
        at_ms: u64,
    },
    CountdownTick {
        remaining: u8,
        at_ms: u64,
    },
    /// The engine is ready for the next trial; the task layer must supply it.
    TrialRequested {
        index: usize,
        at_ms: u64,
    },
    /// A trial has been queued with its lead-in delay armed.
    TrialArmed {
        index: usize,
        lead_in_ms: u64,
        at_ms: u64,
    },
    TrialPresented {
        index: usize,
        at_ms: u64,
    },
    /// One presentation sub-step (an operation reveal) fired.
    RevealStep {
        index: usize,
        step: usize,
        at_ms: u64,
    },
    ResponseWindowOpened {
        index: usize,
        at_ms: u64,
    },
    ResponseRecorded {
        index: usize,
        correct: bool,
        reaction_time_ms: u64,
        at_ms: u64,
    },
    TrialTimedOut {
        index: usize,
        at_ms: u64,
    },
    /// Feedback cooldown elapsed; the trial is terminal.
    TrialFinished {
        index: usize,
        at_ms: u64,
    },
    SessionCompleted {
        at_ms: u64,
    },
    SessionAborted {
        at_ms: u64,
    },
}

impl Event {
    /// Engine-clock timestamp of the event.
    pub fn at_ms(&self) -> u64 {
        match self {
            Event::SessionStarted { at_ms, .. }
            | Event::CountdownTick { at_ms, .. }
            | Event::TrialRequested { at_ms, .. }
            | Event::TrialArmed { at_ms, .. }
            | Event::TrialPresented { at_ms, .. }
            | Event::RevealStep { at_ms, .. }
            | Event::ResponseWindowOpened { at_ms, .. }
            | Event::ResponseRecorded { at_ms, .. }
            | Event::TrialTimedOut { at_ms, .. }
            | Event::TrialFinished { at_ms, .. }
            | Event::SessionCompleted { at_ms }
            | Event::SessionAborted { at_ms } => *at_ms,
        }
    }
}
