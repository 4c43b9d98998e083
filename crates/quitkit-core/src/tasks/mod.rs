//! The three self-contained mini-assessments. Each pairs a
//! deterministic builder/scheduler with a session wrapper around the
//! shared [`SessionEngine`](crate::engine::SessionEngine).

pub mod arithmetic;
pub mod reaction;
pub mod stroop;

pub use arithmetic::{
    ArithmeticConfig, ArithmeticSession, DifficultyParams, Op, Sequence, SequenceBuilder, Sign,
};
pub use reaction::{
    PlayArea, ReactionConfig, ReactionSession, ReactionTargetScheduler, Target, TARGET_RADIUS,
};
pub use stroop::{
    Color, StroopConfig, StroopMode, StroopSession, StroopTrial, StroopTrialBuilder, StroopWord,
};
