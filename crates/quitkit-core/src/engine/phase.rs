use serde::{Deserialize, Serialize};

/// Phase of a running assessment session.
///
/// ```text
/// Intro -> Countdown? -> Waiting -> Presenting -> Responding -> Feedback
///                           ^                                      |
///                           +-------------- next trial ------------+
///                                            (or Complete)
/// ```
///
/// `Waiting` covers the gap between trials and any pre-presentation
/// lead-in delay. Exactly one trial is live at a time; trial `k+1`
/// never leaves `Waiting` before trial `k` reached `Feedback` end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialPhase {
    Idle,
    Countdown,
    Waiting,
    Presenting,
    Responding,
    Feedback,
    Complete,
}

impl TrialPhase {
    /// Responses are accepted only while the response window is open.
    pub fn accepts_response(&self) -> bool {
        matches!(self, TrialPhase::Responding)
    }

    /// A trial is in flight (queued, presenting, or awaiting its feedback end).
    pub fn in_trial(&self) -> bool {
        matches!(
            self,
            TrialPhase::Waiting | TrialPhase::Presenting | TrialPhase::Responding | TrialPhase::Feedback
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrialPhase::Complete)
    }
}
