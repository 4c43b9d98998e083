//! Per-trial classification and session-level aggregation.
//!
//! Task modules normalize their trial records into [`TrialSample`]s and
//! hand them to [`summarize`], which produces the one artifact that
//! crosses into persistence: a [`SessionSummary`]. Optional metrics are
//! `Option` fields omitted from the serialized record when their
//! preconditions do not hold -- an absent delta and a zero delta mean
//! different things.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which assessment produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentMode {
    Stroop,
    Arithmetic,
    Reaction,
}

impl AssessmentMode {
    /// Stable tag used for history namespacing and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentMode::Stroop => "stroop",
            AssessmentMode::Arithmetic => "arithmetic",
            AssessmentMode::Reaction => "reaction",
        }
    }
}

/// One trial, normalized for aggregation.
///
/// `latency_ms` carries only latencies eligible for timing statistics;
/// a task that excludes out-of-range reaction times (or a timed-out
/// trial) passes `None` while still counting in the accuracy tally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSample {
    pub correct: bool,
    pub latency_ms: Option<f64>,
    /// `Some` only for color-word trials; `None` for lure trials and
    /// for the other two tasks.
    pub congruent: Option<bool>,
    pub lure: bool,
}

/// Aggregated outcome of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub mode: AssessmentMode,
    pub total_trials: usize,
    pub correct: usize,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rt_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_rt_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rt_congruent_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rt_incongruent_ms: Option<f64>,
    /// `mean(incongruent) - mean(congruent)`; negative values are a
    /// legitimate outcome, not an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interference_ms: Option<f64>,
    /// `mean(lure) - mean(non-lure)`; present only when both groups
    /// recorded at least one latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias_ms: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl SessionSummary {
    /// Structural check applied to records read back from storage.
    /// Anything failing it is dropped, not surfaced.
    pub fn is_well_formed(&self) -> bool {
        let finite = |v: Option<f64>| v.map_or(true, f64::is_finite);
        self.correct <= self.total_trials
            && self.accuracy.is_finite()
            && (0.0..=1.0).contains(&self.accuracy)
            && finite(self.mean_rt_ms)
            && finite(self.median_rt_ms)
            && finite(self.mean_rt_congruent_ms)
            && finite(self.mean_rt_incongruent_ms)
            && finite(self.interference_ms)
            && finite(self.bias_ms)
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median with even-length averaging; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Aggregate a finished session's samples into its summary.
pub fn summarize(mode: AssessmentMode, samples: &[TrialSample]) -> SessionSummary {
    let total_trials = samples.len();
    let correct = samples.iter().filter(|s| s.correct).count();
    let accuracy = if total_trials == 0 {
        0.0
    } else {
        correct as f64 / total_trials as f64
    };

    let latencies: Vec<f64> = samples.iter().filter_map(|s| s.latency_ms).collect();
    let mean_rt_ms = mean(&latencies);
    let median_rt_ms = median(&latencies);

    let (mut mean_rt_congruent_ms, mut mean_rt_incongruent_ms) = (None, None);
    let (mut interference_ms, mut bias_ms) = (None, None);

    if mode == AssessmentMode::Stroop {
        let group = |pred: &dyn Fn(&TrialSample) -> bool| -> Vec<f64> {
            samples
                .iter()
                .filter(|s| pred(s))
                .filter_map(|s| s.latency_ms)
                .collect()
        };
        let congruent = group(&|s| s.congruent == Some(true));
        let incongruent = group(&|s| s.congruent == Some(false));
        mean_rt_congruent_ms = mean(&congruent);
        mean_rt_incongruent_ms = mean(&incongruent);
        if let (Some(c), Some(i)) = (mean_rt_congruent_ms, mean_rt_incongruent_ms) {
            interference_ms = Some(i - c);
        }

        let lure = group(&|s| s.lure);
        let plain = group(&|s| !s.lure);
        if let (Some(l), Some(p)) = (mean(&lure), mean(&plain)) {
            bias_ms = Some(l - p);
        }
    }

    SessionSummary {
        id: Uuid::new_v4(),
        mode,
        total_trials,
        correct,
        accuracy,
        mean_rt_ms,
        median_rt_ms,
        mean_rt_congruent_ms,
        mean_rt_incongruent_ms,
        interference_ms,
        bias_ms,
        timestamp: Utc::now(),
    }
}
