//! Cancellable deadline timers for the session engine.
//!
//! There is no background thread and no blocking wait. Arming a timer
//! records a deadline; the owner polls [`TimerSet::fire_due`] with its
//! clock and acts on whatever came due. Every armed timer is stamped
//! with the set's current generation token. Cancelling a single timer
//! removes its entry; invalidating the whole set only bumps the
//! generation, so an entry armed before an abort can still be sitting
//! in the queue when its deadline passes -- `fire_due` compares the
//! stamp and discards it without firing. A stale timer is a no-op by
//! construction, not by bookkeeping discipline.

/// What an armed timer means to the session engine when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Pre-session countdown; `remaining` is the value to display next.
    Countdown { remaining: u8 },
    /// Lead-in delay before a queued trial is presented.
    LeadIn,
    /// Presentation sub-step (an operation reveal).
    Reveal { step: usize },
    /// The response window opens.
    ResponseOpen,
    /// The response window expires.
    ResponseTimeout,
    /// Feedback cooldown ends; advance to the next trial or the summary.
    Feedback,
}

/// Opaque handle for cancelling one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct ArmedTimer {
    id: u64,
    generation: u64,
    deadline_ms: u64,
    kind: TimerKind,
}

/// A set of pending deadlines owned by one session.
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    next_id: u64,
    generation: u64,
    armed: Vec<ArmedTimer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation token. Timers armed now fire only while this
    /// generation is still current.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Arm a timer for `deadline_ms` on the engine clock.
    pub fn arm(&mut self, kind: TimerKind, deadline_ms: u64) -> TimerHandle {
        self.next_id += 1;
        self.armed.push(ArmedTimer {
            id: self.next_id,
            generation: self.generation,
            deadline_ms,
            kind,
        });
        TimerHandle(self.next_id)
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.armed.len();
        self.armed.retain(|t| t.id != handle.0);
        self.armed.len() != before
    }

    /// Invalidate every armed timer by bumping the generation.
    ///
    /// Entries are deliberately left in the queue: the stale-fire guard in
    /// [`fire_due`](Self::fire_due) is what guarantees they are inert.
    pub fn invalidate_all(&mut self) {
        self.generation += 1;
    }

    /// Drop all entries and start a fresh generation. Used on session reset.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.armed.clear();
    }

    /// Number of timers that can still fire.
    pub fn live_count(&self) -> usize {
        self.armed
            .iter()
            .filter(|t| t.generation == self.generation)
            .count()
    }

    /// Remove every timer whose deadline has passed and return the kinds
    /// of those from the current generation, in deadline order. Stale
    /// entries (older generation) are removed silently.
    pub fn fire_due(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let mut due: Vec<ArmedTimer> = Vec::new();
        self.armed.retain(|t| {
            if t.deadline_ms <= now_ms {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.deadline_ms, t.id));
        due.into_iter()
            .filter(|t| t.generation == self.generation)
            .map(|t| t.kind)
            .collect()
    }
}
