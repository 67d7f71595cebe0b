//! Core error types for annoying-toggl-core.
//!
//! Remote failures, configuration problems and reminder-level failures each
//! get their own enum; [`CoreError`] wraps them for callers that do not care
//! which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for annoying-toggl-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Toggl API errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder workflow errors
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single call against the tracking service.
///
/// Never fatal. Scheduled checks log it and wait for the next tick.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection, TLS or timeout failure
    #[error("Transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("Toggl API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON we expected
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No home directory to put the config in
    #[error("Could not determine the configuration directory")]
    NoDataDir,
}

/// Errors surfaced by user-initiated reminder actions.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// A single remote call failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The running entry was stopped but the replacement could not be started.
    /// Nothing is tracked until the next check notices.
    #[error("Stopped entry {stopped_entry} but failed to start the new one: {source}")]
    PartialFailure {
        stopped_entry: i64,
        #[source]
        source: RemoteError,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
