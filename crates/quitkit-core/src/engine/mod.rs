mod phase;
mod session;
mod timers;

pub use phase::TrialPhase;
pub use session::{SessionEngine, TrialRecord, TrialTimings};
pub use timers::{TimerHandle, TimerKind, TimerSet};
