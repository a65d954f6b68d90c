//! Failure categories for error records.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// Errors actions can raise when they want a specific `error_type`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ActionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::DivisionByZero => "division by zero",
            ActionError::MissingArgument(_) => "missing argument",
            ActionError::InvalidArgument(_) => "invalid argument",
        }
    }
}

/// Category of a failed action: the first recognised error in the chain.
pub fn error_kind(report: &eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(e) = cause.downcast_ref::<ActionError>() {
            return e.kind().to_string();
        }
        if cause.is::<ParseIntError>() {
            return "ParseIntError".to_string();
        }
        if cause.is::<ParseFloatError>() {
            return "ParseFloatError".to_string();
        }
        if let Some(e) = cause.downcast_ref::<std::io::Error>() {
            return format!("io::{:?}", e.kind());
        }
        if cause.is::<serde_json::Error>() {
            return "serde_json::Error".to_string();
        }
    }
    "error".to_string()
}
