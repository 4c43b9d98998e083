//! # Quitkit Core Library
//!
//! This library provides the cognitive-assessment engine for Quitkit,
//! a companion app for cutting down on smoking. It implements a
//! CLI-first philosophy: everything here runs headless behind a thin
//! shell (the bundled CLI, or a mobile GUI layer) that only renders
//! events and forwards input.
//!
//! ## Architecture
//!
//! - **Trial engine**: a tick-based phase state machine that requires
//!   the caller to periodically invoke `tick(now_ms)` for progress;
//!   timers are armed deadlines guarded by a generation token
//! - **Tasks**: three mini-assessments (color-word interference,
//!   arithmetic sequence tracking, spatial reaction time), each a
//!   deterministic builder plus a session wrapper
//! - **Scoring**: per-trial classification and session aggregation into
//!   a single persisted summary
//! - **Storage**: capped JSON session history and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: generic phase controller for one session
//! - [`SeededStream`]: reproducible random stream behind every builder
//! - [`StroopSession`] / [`ArithmeticSession`] / [`ReactionSession`]:
//!   the three assessments
//! - [`SessionStore`]: append-then-list session persistence

pub mod engine;
pub mod error;
pub mod events;
pub mod rng;
pub mod scoring;
pub mod storage;
pub mod tasks;

pub use engine::{SessionEngine, TrialPhase, TrialRecord, TrialTimings};
pub use error::{ConfigError, CoreError, Result, StorageError};
pub use events::Event;
pub use rng::SeededStream;
pub use scoring::{summarize, AssessmentMode, SessionSummary, TrialSample};
pub use storage::{append_detached, AppConfig, JsonHistoryStore, SessionStore, HISTORY_CAP};
pub use tasks::{
    ArithmeticConfig, ArithmeticSession, ReactionConfig, ReactionSession, StroopConfig,
    StroopSession,
};
