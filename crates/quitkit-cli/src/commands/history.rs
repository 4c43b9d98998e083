use clap::Subcommand;
use quitkit_core::{AssessmentMode, JsonHistoryStore, SessionStore, SessionSummary};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List stored summaries, most-recent-last
    List {
        /// Restrict to one assessment (stroop | arithmetic | reaction)
        #[arg(long)]
        mode: Option<String>,
        /// Keep only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete stored summaries
    Clear {
        /// Restrict to one assessment (stroop | arithmetic | reaction)
        #[arg(long)]
        mode: Option<String>,
    },
}

const ALL_MODES: [AssessmentMode; 3] = [
    AssessmentMode::Stroop,
    AssessmentMode::Arithmetic,
    AssessmentMode::Reaction,
];

fn parse_mode(mode: &str) -> Result<AssessmentMode, Box<dyn std::error::Error>> {
    match mode {
        "stroop" => Ok(AssessmentMode::Stroop),
        "arithmetic" => Ok(AssessmentMode::Arithmetic),
        "reaction" => Ok(AssessmentMode::Reaction),
        other => Err(format!("unknown mode: {other}").into()),
    }
}

fn selected(mode: Option<&str>) -> Result<Vec<AssessmentMode>, Box<dyn std::error::Error>> {
    match mode {
        Some(mode) => Ok(vec![parse_mode(mode)?]),
        None => Ok(ALL_MODES.to_vec()),
    }
}

fn store_for(mode: AssessmentMode) -> Result<JsonHistoryStore, Box<dyn std::error::Error>> {
    Ok(JsonHistoryStore::open(&format!("sessions-{}", mode.as_str()))?)
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List { mode, limit } => {
            let mut summaries: Vec<SessionSummary> = Vec::new();
            for mode in selected(mode.as_deref())? {
                summaries.extend(store_for(mode)?.list());
            }
            summaries.sort_by_key(|s| s.timestamp);
            if let Some(limit) = limit {
                let skip = summaries.len().saturating_sub(limit);
                summaries.drain(0..skip);
            }
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        HistoryAction::Clear { mode } => {
            for mode in selected(mode.as_deref())? {
                store_for(mode)?.clear()?;
            }
        }
    }
    Ok(())
}
