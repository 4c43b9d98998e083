//! Generic trial-session state machine.
//!
//! One [`SessionEngine`] drives a full assessment session for any of the
//! three tasks. It is a tick-based machine: it never blocks and never
//! spawns threads -- the caller polls [`tick`](SessionEngine::tick) with
//! its millisecond clock and reacts to the returned [`Event`]s. All
//! "suspension" (lead-in delays, reveal steps, response timeouts,
//! feedback cooldowns) is armed deadlines in a [`TimerSet`].
//!
//! The task layer supplies trials on demand: when the engine emits
//! [`Event::TrialRequested`], the owner generates the next trial and
//! hands it over with [`begin_trial`](SessionEngine::begin_trial).
//!
//! A qualifying response and the response timeout are mutually
//! exclusive: whichever fires first records the trial and the other
//! becomes a no-op (the response cancels the armed timeout; a timeout
//! moves the phase out of `Responding` so late responses are ignored).
//! [`abort`](SessionEngine::abort) invalidates every armed timer before
//! touching any other state, so a deadline passing after abandonment
//! can never mutate the frozen result list.

use serde::Serialize;
use tracing::debug;

use super::phase::TrialPhase;
use super::timers::{TimerHandle, TimerKind, TimerSet};
use crate::events::Event;
use crate::scoring::AssessmentMode;

/// Per-trial timing plan, all offsets in engine-clock milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialTimings {
    /// Delay between queuing the trial and presenting it.
    pub lead_in_ms: u64,
    /// Presentation sub-steps, as offsets from presentation.
    pub reveal_offsets_ms: Vec<u64>,
    /// When the response window opens, as an offset from presentation.
    pub response_open_offset_ms: u64,
    /// Response window length; `None` leaves the window open until a
    /// response arrives.
    pub response_timeout_ms: Option<u64>,
    /// Cooldown between the trial outcome and the next trial.
    pub feedback_ms: u64,
}

impl TrialTimings {
    /// Present immediately and open the response window at presentation.
    /// The shape used by the color-word and reaction tasks.
    pub fn immediate(response_timeout_ms: Option<u64>, feedback_ms: u64) -> Self {
        Self {
            lead_in_ms: 0,
            reveal_offsets_ms: Vec::new(),
            response_open_offset_ms: 0,
            response_timeout_ms,
            feedback_ms,
        }
    }

    /// Same as [`immediate`](Self::immediate) with a lead-in delay first.
    pub fn delayed(lead_in_ms: u64, response_timeout_ms: Option<u64>, feedback_ms: u64) -> Self {
        Self {
            lead_in_ms,
            ..Self::immediate(response_timeout_ms, feedback_ms)
        }
    }
}

/// Outcome of one trial. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord<T> {
    pub trial: T,
    pub correct: bool,
    /// Latency from response-window open to the qualifying response.
    /// `None` for timed-out trials.
    pub reaction_time_ms: Option<u64>,
    pub timed_out: bool,
}

#[derive(Debug)]
struct LiveTrial<T> {
    trial: T,
    timings: TrialTimings,
    presented_at_ms: Option<u64>,
    response_open_at_ms: Option<u64>,
    timeout_handle: Option<TimerHandle>,
}

/// Tick-driven phase controller for one assessment session.
#[derive(Debug)]
pub struct SessionEngine<T> {
    mode: AssessmentMode,
    trial_count: usize,
    countdown_from: u8,
    phase: TrialPhase,
    timers: TimerSet,
    trial_index: usize,
    current: Option<LiveTrial<T>>,
    results: Vec<TrialRecord<T>>,
    aborted: bool,
}

impl<T: Clone> SessionEngine<T> {
    /// Create an engine in the idle phase. `countdown_from == 0` skips
    /// the countdown and requests the first trial straight away.
    pub fn new(mode: AssessmentMode, trial_count: usize, countdown_from: u8) -> Self {
        Self {
            mode,
            trial_count,
            countdown_from,
            phase: TrialPhase::Idle,
            timers: TimerSet::new(),
            trial_index: 0,
            current: None,
            results: Vec::new(),
            aborted: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> AssessmentMode {
        self.mode
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// Index of the trial currently in flight (or requested next).
    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    /// Completed trials out of the configured total.
    pub fn progress(&self) -> (usize, usize) {
        (self.results.len(), self.trial_count)
    }

    pub fn results(&self) -> &[TrialRecord<T>] {
        &self.results
    }

    /// True once every trial reached a terminal outcome.
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal() && !self.aborted
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    pub fn current_trial(&self) -> Option<&T> {
        self.current.as_ref().map(|c| &c.trial)
    }

    pub fn current_trial_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut().map(|c| &mut c.trial)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) the session. Unconditionally resets counters,
    /// results, and timer handles; timers armed by a previous run are
    /// invalidated before anything else happens.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        self.timers.reset();
        self.trial_index = 0;
        self.current = None;
        self.results.clear();
        self.aborted = false;

        let mut events = vec![Event::SessionStarted {
            mode: self.mode,
            trial_count: self.trial_count,
            at_ms: now_ms,
        }];

        if self.trial_count == 0 {
            self.phase = TrialPhase::Complete;
            events.push(Event::SessionCompleted { at_ms: now_ms });
            return events;
        }

        if self.countdown_from > 0 {
            self.phase = TrialPhase::Countdown;
            events.push(Event::CountdownTick {
                remaining: self.countdown_from,
                at_ms: now_ms,
            });
            for i in 1..=self.countdown_from {
                let remaining = self.countdown_from - i;
                self.timers
                    .arm(TimerKind::Countdown { remaining }, now_ms + u64::from(i) * 1000);
            }
        } else {
            self.phase = TrialPhase::Waiting;
            events.push(Event::TrialRequested {
                index: 0,
                at_ms: now_ms,
            });
        }
        events
    }

    /// Hand the engine the trial it asked for via [`Event::TrialRequested`].
    /// A no-op unless the engine is actually waiting for one.
    pub fn begin_trial(&mut self, trial: T, timings: TrialTimings, now_ms: u64) -> Vec<Event> {
        if self.phase != TrialPhase::Waiting || self.current.is_some() {
            debug!(phase = ?self.phase, "begin_trial ignored");
            return Vec::new();
        }
        let lead_in_ms = timings.lead_in_ms;
        self.timers.arm(TimerKind::LeadIn, now_ms + lead_in_ms);
        self.current = Some(LiveTrial {
            trial,
            timings,
            presented_at_ms: None,
            response_open_at_ms: None,
            timeout_handle: None,
        });
        vec![Event::TrialArmed {
            index: self.trial_index,
            lead_in_ms,
            at_ms: now_ms,
        }]
    }

    /// Advance the engine clock. Fires every due timer (in deadline
    /// order, cascading within the same call) and returns the resulting
    /// events. Safe to call at any frequency.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.phase.is_terminal() || self.phase == TrialPhase::Idle {
            return events;
        }
        loop {
            let fired = self.timers.fire_due(now_ms);
            if fired.is_empty() {
                break;
            }
            for kind in fired {
                self.handle_fire(kind, now_ms, &mut events);
            }
        }
        events
    }

    /// Record a classified response for the live trial. Returns an empty
    /// vec when no response window is open (late, duplicate, or stale
    /// input), leaving all state untouched.
    pub fn respond(&mut self, correct: bool, now_ms: u64) -> Vec<Event> {
        if !self.phase.accepts_response() {
            debug!(phase = ?self.phase, "response ignored");
            return Vec::new();
        }
        let Some(cur) = self.current.as_mut() else {
            return Vec::new();
        };
        let opened = cur.response_open_at_ms.unwrap_or(now_ms);
        let reaction_time_ms = now_ms.saturating_sub(opened);
        let trial = cur.trial.clone();
        let feedback_ms = cur.timings.feedback_ms;
        let timeout_handle = cur.timeout_handle.take();

        // The response wins the race: the armed timeout must never fire.
        if let Some(h) = timeout_handle {
            self.timers.cancel(h);
        }
        self.results.push(TrialRecord {
            trial,
            correct,
            reaction_time_ms: Some(reaction_time_ms),
            timed_out: false,
        });
        self.phase = TrialPhase::Feedback;
        self.timers.arm(TimerKind::Feedback, now_ms + feedback_ms);
        vec![Event::ResponseRecorded {
            index: self.trial_index,
            correct,
            reaction_time_ms,
            at_ms: now_ms,
        }]
    }

    /// Abandon the session. Every armed timer is invalidated before any
    /// other mutation; the recorded results are frozen as-is and no
    /// summary will be produced.
    pub fn abort(&mut self, now_ms: u64) -> Vec<Event> {
        if self.phase.is_terminal() {
            return Vec::new();
        }
        self.timers.invalidate_all();
        self.current = None;
        self.phase = TrialPhase::Complete;
        self.aborted = true;
        vec![Event::SessionAborted { at_ms: now_ms }]
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn handle_fire(&mut self, kind: TimerKind, now_ms: u64, events: &mut Vec<Event>) {
        match kind {
            TimerKind::Countdown { remaining } => {
                if self.phase != TrialPhase::Countdown {
                    return;
                }
                if remaining > 0 {
                    events.push(Event::CountdownTick {
                        remaining,
                        at_ms: now_ms,
                    });
                } else {
                    self.phase = TrialPhase::Waiting;
                    events.push(Event::TrialRequested {
                        index: self.trial_index,
                        at_ms: now_ms,
                    });
                }
            }
            TimerKind::LeadIn => {
                if self.phase != TrialPhase::Waiting {
                    return;
                }
                let Some(cur) = self.current.as_mut() else {
                    return;
                };
                cur.presented_at_ms = Some(now_ms);
                self.phase = TrialPhase::Presenting;
                events.push(Event::TrialPresented {
                    index: self.trial_index,
                    at_ms: now_ms,
                });
                let reveal_offsets = cur.timings.reveal_offsets_ms.clone();
                let open_offset = cur.timings.response_open_offset_ms;
                for (step, offset) in reveal_offsets.into_iter().enumerate() {
                    self.timers.arm(TimerKind::Reveal { step }, now_ms + offset);
                }
                if open_offset == 0 {
                    self.open_response(now_ms, events);
                } else {
                    self.timers.arm(TimerKind::ResponseOpen, now_ms + open_offset);
                }
            }
            TimerKind::Reveal { step } => {
                if self.phase != TrialPhase::Presenting {
                    return;
                }
                events.push(Event::RevealStep {
                    index: self.trial_index,
                    step,
                    at_ms: now_ms,
                });
            }
            TimerKind::ResponseOpen => {
                if self.phase != TrialPhase::Presenting {
                    return;
                }
                self.open_response(now_ms, events);
            }
            TimerKind::ResponseTimeout => {
                // Phase guard: a recorded response already moved us to
                // Feedback and cancelled this timer; double protection.
                if self.phase != TrialPhase::Responding {
                    return;
                }
                let Some(cur) = self.current.as_mut() else {
                    return;
                };
                let trial = cur.trial.clone();
                let feedback_ms = cur.timings.feedback_ms;
                cur.timeout_handle = None;
                self.results.push(TrialRecord {
                    trial,
                    correct: false,
                    reaction_time_ms: None,
                    timed_out: true,
                });
                self.phase = TrialPhase::Feedback;
                self.timers.arm(TimerKind::Feedback, now_ms + feedback_ms);
                events.push(Event::TrialTimedOut {
                    index: self.trial_index,
                    at_ms: now_ms,
                });
            }
            TimerKind::Feedback => {
                if self.phase != TrialPhase::Feedback {
                    return;
                }
                self.current = None;
                let finished = self.trial_index;
                self.trial_index += 1;
                events.push(Event::TrialFinished {
                    index: finished,
                    at_ms: now_ms,
                });
                if self.trial_index >= self.trial_count {
                    self.phase = TrialPhase::Complete;
                    events.push(Event::SessionCompleted { at_ms: now_ms });
                } else {
                    self.phase = TrialPhase::Waiting;
                    events.push(Event::TrialRequested {
                        index: self.trial_index,
                        at_ms: now_ms,
                    });
                }
            }
        }
    }

    fn open_response(&mut self, now_ms: u64, events: &mut Vec<Event>) {
        let Some(cur) = self.current.as_mut() else {
            return;
        };
        cur.response_open_at_ms = Some(now_ms);
        self.phase = TrialPhase::Responding;
        let timeout = cur.timings.response_timeout_ms;
        if let Some(timeout_ms) = timeout {
            let handle = self.timers.arm(TimerKind::ResponseTimeout, now_ms + timeout_ms);
            if let Some(cur) = self.current.as_mut() {
                cur.timeout_handle = Some(handle);
            }
        }
        events.push(Event::ResponseWindowOpened {
            index: self.trial_index,
            at_ms: now_ms,
        });
    }
}
