//! Core error types for quitkit-core.
//!
//! Gameplay paths never fail (see the engine and task modules); these types
//! cover the storage and configuration surface that the CLI and GUI shells
//! call into.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quitkit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// History-store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Session-history storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open or create the history file
    #[error("Failed to open history at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the history file
    #[error("Failed to write history at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The history file is not valid JSON at the top level
    #[error("History at {path} is not a JSON array: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Serialization of a summary failed
    #[error("Failed to encode session summary: {0}")]
    EncodeFailed(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key passed to get/set
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Value could not be parsed for the key's type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be resolved or created
    #[error("Failed to prepare data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
