//! Error types for chloop
//!
//! Centralized error handling using thiserror. Failures raised *inside* user
//! actions are not represented here; those are `eyre::Report`s captured by the
//! invocation wrapper and turned into error records.

use thiserror::Error;

/// All error types that can occur in the loop machinery
#[derive(Debug, Error)]
pub enum ChloopError {
    /// Typed command name has no registered action
    #[error("invalid command: {0}")]
    UnknownCommand(String),

    /// Hotkey or command binding that could never fire
    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    /// Log sink persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// External interactive session failed to launch
    #[error("Session error: {0}")]
    Session(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chloop operations
pub type Result<T> = std::result::Result<T, ChloopError>;
