//! Run a full assessment session end-to-end with a simulated
//! participant on a virtual clock. Deterministic under `--seed`: the
//! same seed replays the same trials and the same simulated responses.

use std::sync::Arc;

use clap::Subcommand;
use quitkit_core::tasks::arithmetic::ArithmeticSession;
use quitkit_core::tasks::reaction::ReactionSession;
use quitkit_core::tasks::stroop::{Color, StroopSession};
use quitkit_core::{
    append_detached, AppConfig, Event, JsonHistoryStore, SeededStream, SessionSummary,
};

#[derive(Subcommand)]
pub enum RunAction {
    /// Color-word interference session
    Stroop {
        /// Seed for a reproducible session (random if omitted)
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long)]
        trials: Option<usize>,
        /// Suppress the event log, print only the summary
        #[arg(long)]
        quiet: bool,
    },
    /// Arithmetic sequence session
    Arithmetic {
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long)]
        trials: Option<usize>,
        /// Difficulty level 1-10
        #[arg(long)]
        level: Option<u8>,
        #[arg(long)]
        quiet: bool,
    },
    /// Spatial reaction session
    Reaction {
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long)]
        trials: Option<usize>,
        #[arg(long)]
        quiet: bool,
    },
}

pub fn run(action: RunAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_or_default();
    match action {
        RunAction::Stroop { seed, trials, quiet } => {
            let mut task = config.stroop.clone();
            if let Some(trials) = trials {
                task.trials = trials;
            }
            let stream = make_stream(seed);
            eprintln!("seed: {}", stream.seed());
            let mut session = StroopSession::new(task, stream);
            let mut participant = participant_stream(session.seed());
            drive_stroop(&mut session, &mut participant, quiet);
            finish("sessions-stroop", session.summary())
        }
        RunAction::Arithmetic {
            seed,
            trials,
            level,
            quiet,
        } => {
            let mut task = config.arithmetic.clone();
            if let Some(trials) = trials {
                task.trials = trials;
            }
            if let Some(level) = level {
                task.level = level;
            }
            let stream = make_stream(seed);
            eprintln!("seed: {}", stream.seed());
            let mut session = ArithmeticSession::new(task, stream);
            let mut participant = participant_stream(session.seed());
            drive_arithmetic(&mut session, &mut participant, quiet);
            finish("sessions-arithmetic", session.summary())
        }
        RunAction::Reaction { seed, trials, quiet } => {
            let mut task = config.reaction.clone();
            if let Some(trials) = trials {
                task.trials = trials;
            }
            let stream = make_stream(seed);
            eprintln!("seed: {}", stream.seed());
            let mut session = ReactionSession::new(task, stream);
            let mut participant = participant_stream(session.seed());
            drive_reaction(&mut session, &mut participant, quiet);
            finish("sessions-reaction", session.summary())
        }
    }
}

fn make_stream(seed: Option<i64>) -> SeededStream {
    match seed {
        Some(seed) => SeededStream::new(seed),
        None => SeededStream::from_entropy(),
    }
}

/// Separate stream for the simulated participant, derived from the
/// session's effective seed so a replayed session replays the
/// responses too.
fn participant_stream(session_seed: i64) -> SeededStream {
    SeededStream::new(session_seed.wrapping_mul(31).wrapping_add(7))
}

fn emit(events: &[Event], quiet: bool) {
    if quiet {
        return;
    }
    for event in events {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
    }
}

fn window_opened(events: &[Event]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::ResponseWindowOpened { .. }))
}

fn drive_stroop(session: &mut StroopSession, participant: &mut SeededStream, quiet: bool) {
    let mut now = 0u64;
    emit(&session.start(now), quiet);
    while !session.is_finished() && now < 10_000_000 {
        now += 10;
        let events = session.tick(now);
        let opened = window_opened(&events);
        emit(&events, quiet);
        if !opened {
            continue;
        }
        let Some(trial) = session.current_trial() else {
            continue;
        };
        // Incongruent trials slow the simulated participant down.
        let latency = match trial.congruent {
            Some(false) => participant.range_u64(540, 820),
            _ => participant.range_u64(420, 700),
        };
        let answer = if participant.chance(0.85) {
            trial.target
        } else {
            let others: Vec<Color> = Color::ALL.iter().copied().filter(|c| *c != trial.target).collect();
            others[participant.index(others.len())]
        };
        now += latency;
        emit(&session.respond(answer, now), quiet);
    }
}

fn drive_arithmetic(session: &mut ArithmeticSession, participant: &mut SeededStream, quiet: bool) {
    let mut now = 0u64;
    emit(&session.start(now), quiet);
    while !session.is_finished() && now < 10_000_000 {
        now += 50;
        let events = session.tick(now);
        let opened = window_opened(&events);
        emit(&events, quiet);
        if !opened {
            continue;
        }
        let Some(sequence) = session.current_sequence() else {
            continue;
        };
        let answer = if participant.chance(0.8) {
            sequence.result
        } else {
            sequence.result + 1 + participant.index(3) as i32
        };
        let latency = participant.range_u64(1200, 3500);
        now += latency;
        emit(&session.respond(answer, now), quiet);
    }
}

fn drive_reaction(session: &mut ReactionSession, participant: &mut SeededStream, quiet: bool) {
    let mut now = 0u64;
    emit(&session.start(now), quiet);
    while !session.is_finished() && now < 10_000_000 {
        now += 10;
        let events = session.tick(now);
        let opened = window_opened(&events);
        emit(&events, quiet);
        if !opened {
            continue;
        }
        // One target in ten gets missed entirely.
        if participant.chance(0.1) {
            continue;
        }
        let Some(target) = session.current_target() else {
            continue;
        };
        let (x, y) = (target.x, target.y);
        let latency = participant.range_u64(180, 650);
        now += latency;
        emit(&session.tap(x, y, now), quiet);
    }
}

/// Print the summary and persist it without blocking on the write.
fn finish(namespace: &str, summary: Option<SessionSummary>) -> Result<(), Box<dyn std::error::Error>> {
    let summary = summary.ok_or("session did not complete")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let store = Arc::new(JsonHistoryStore::open(namespace)?);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        append_detached(store, summary);
    });
    // Dropping the runtime flushes the detached write.
    Ok(())
}
