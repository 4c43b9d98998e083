mod config;
pub mod history;

pub use config::AppConfig;
pub use history::{append_detached, JsonHistoryStore, SessionStore, HISTORY_CAP};

use std::path::PathBuf;

/// Returns `~/.config/quitkit[-dev]/` based on QUITKIT_ENV.
///
/// Set QUITKIT_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUITKIT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quitkit-dev")
    } else {
        base_dir.join("quitkit")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
