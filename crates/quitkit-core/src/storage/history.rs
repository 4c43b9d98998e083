//! Capped, append-only session history.
//!
//! Summaries are stored as a JSON array in one namespaced file per
//! assessment under the data directory, oldest first. The list is
//! trimmed to [`HISTORY_CAP`] entries on every append (oldest dropped
//! first). Reads shape-validate each record individually: one corrupted
//! entry is dropped without taking the rest of the history with it, and
//! no read path ever surfaces a parse error to gameplay code.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::scoring::SessionSummary;

/// Maximum retained summaries per namespace.
pub const HISTORY_CAP: usize = 50;

/// Append-then-list-visible session persistence, most-recent-last.
pub trait SessionStore {
    /// Persist one summary. Call sites on the gameplay path treat this
    /// as best-effort (see [`append_detached`]).
    fn append(&self, summary: &SessionSummary) -> Result<(), StorageError>;

    /// All retained summaries, oldest first. Unreadable records are
    /// silently dropped; an unreadable file reads as empty.
    fn list(&self) -> Vec<SessionSummary>;
}

/// File-backed store: one JSON array per namespace.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    /// Open the store for a namespace (e.g. `sessions-stroop`) under
    /// the application data directory.
    pub fn open(namespace: &str) -> Result<Self, StorageError> {
        let dir = super::data_dir().map_err(|source| StorageError::OpenFailed {
            path: PathBuf::from(namespace),
            source,
        })?;
        Ok(Self {
            path: dir.join(format!("{namespace}.json")),
        })
    }

    /// Open the store at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the whole namespace. Missing files are fine.
    pub fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::WriteFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn read_raw(&self) -> Result<Vec<Value>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::OpenFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|e| StorageError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl SessionStore for JsonHistoryStore {
    fn append(&self, summary: &SessionSummary) -> Result<(), StorageError> {
        // A history file damaged beyond top-level parsing must not block
        // new sessions; start over rather than fail the append.
        let mut records = match self.read_raw() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "history unreadable, starting a fresh list");
                Vec::new()
            }
        };
        records.push(serde_json::to_value(summary)?);
        if records.len() > HISTORY_CAP {
            let excess = records.len() - HISTORY_CAP;
            records.drain(0..excess);
        }
        let content = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, content).map_err(|source| StorageError::WriteFailed {
            path: self.path.clone(),
            source,
        })
    }

    fn list(&self) -> Vec<SessionSummary> {
        let raw = match self.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "history unreadable, listing nothing");
                return Vec::new();
            }
        };
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<SessionSummary>(value) {
                Ok(summary) if summary.is_well_formed() => Some(summary),
                Ok(_) => {
                    debug!("dropping structurally invalid summary record");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "dropping unreadable summary record");
                    None
                }
            })
            .collect()
    }
}

/// Fire-and-forget append on a detached blocking task.
///
/// Gameplay never waits on storage: the call returns immediately and a
/// failed write is logged and dropped without touching the in-memory
/// results. Must be called within a tokio runtime.
pub fn append_detached<S>(store: Arc<S>, summary: SessionSummary)
where
    S: SessionStore + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || {
        if let Err(e) = store.append(&summary) {
            warn!(error = %e, "session summary not persisted");
        }
    });
}
