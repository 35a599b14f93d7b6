//! Core error types for tickwell-core.
//!
//! This module defines the error hierarchy using thiserror. Race conditions
//! in the tick loop (a tick arriving for a paused or deleted timer) are not
//! errors and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tickwell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected at the boundary; engine state is untouched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Audio playback refused; registry state rolled back.
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The runtime session has shut down.
    #[error("Session closed")]
    SessionClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title is {len} characters long (max {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("duration must be greater than zero")]
    NonPositiveDuration,

    /// Scheduled target is not strictly in the future.
    #[error("scheduled time {target_ms} must be after now ({now_ms})")]
    ScheduledInPast { target_ms: u64, now_ms: u64 },

    #[error("cannot parse duration '{0}'")]
    InvalidDuration(String),

    #[error("cannot parse time '{0}'")]
    InvalidTime(String),

    /// Import document failed structural validation.
    #[error("invalid import file: {0}")]
    InvalidImport(String),

    #[error("unknown white noise track '{0}'")]
    UnknownTrack(String),
}

/// Playback errors reported by an audio backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The platform refused to start audio, e.g. no output device.
    #[error("playback of '{track}' was refused: {reason}")]
    Refused { track: String, reason: String },

    #[error("audio source '{0}' is unavailable")]
    SourceUnavailable(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
