//! Invocation record types.
//!
//! Field names are stable: the log sink indexes `cmd`, `status` and
//! `error_type`, and saved query templates refer to the rest by name.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{format_timestamp, generate_record_id, now_ms};

/// `cmd` marker for records produced by note mode
pub const NOTE_CMD: &str = "-";

/// `error_type` for typed command names that resolve to nothing
pub const INVALID_COMMAND: &str = "invalid command";

/// Field names owned by the record itself; hook data may not shadow them.
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "session",
    "status",
    "cmd",
    "args",
    "value",
    "error_type",
    "error_value",
    "traceback_string",
    "func_name",
    "func_doc",
    "func_module",
    "args_repr",
    "hostname",
    "epoch_ms",
    "timestamp",
];

/// Outcome of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    /// Get the string form used in storage and queries
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything captured about an action that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Failure {
    /// Failure category, e.g. `panic` or `division by zero`
    pub error_type: String,
    /// Failure message
    pub error_value: String,
    /// Cause chain or panic backtrace; never empty
    pub traceback: String,
    /// Name the action was registered under
    pub func_name: Option<String>,
    /// Documentation of the action
    pub func_doc: Option<String>,
    /// Module path of the callable
    pub func_module: Option<String>,
    /// Debug rendering of the arguments
    pub args_repr: String,
    /// Host the failure happened on
    pub hostname: String,
}

/// The structured outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Unique record identifier
    pub id: String,
    /// Session (loop name) the record belongs to
    pub session: String,
    pub status: Status,
    /// Resolved command name, or a note/hotkey marker
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Return value of a successful action; absent when it returned null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_repr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Unix timestamp in milliseconds
    pub epoch_ms: u64,
    /// Local, human-readable form of `epoch_ms`
    pub timestamp: String,
    /// Note text and hook-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvocationRecord {
    fn base(session: &str, status: Status, cmd: &str, args: Vec<String>) -> Self {
        let ts = now_ms();
        Self {
            id: generate_record_id(ts),
            session: session.to_string(),
            status,
            cmd: cmd.to_string(),
            args,
            value: None,
            error_type: None,
            error_value: None,
            traceback_string: None,
            func_name: None,
            func_doc: None,
            func_module: None,
            args_repr: None,
            hostname: None,
            epoch_ms: ts,
            timestamp: format_timestamp(ts),
            extra: Map::new(),
        }
    }

    /// Create a success record
    pub fn ok(session: &str, cmd: &str, args: Vec<String>, value: Value) -> Self {
        let mut record = Self::base(session, Status::Ok, cmd, args);
        if !value.is_null() {
            record.value = Some(value);
        }
        record
    }

    /// Create an error record from a captured failure
    pub fn failed(session: &str, cmd: &str, args: Vec<String>, failure: Failure) -> Self {
        let mut record = Self::base(session, Status::Error, cmd, args);
        record.error_type = Some(failure.error_type);
        record.error_value = Some(failure.error_value);
        record.traceback_string = Some(failure.traceback);
        record.func_name = failure.func_name;
        record.func_doc = failure.func_doc;
        record.func_module = failure.func_module;
        record.args_repr = Some(failure.args_repr);
        record.hostname = Some(failure.hostname);
        record
    }

    /// Create the error record for a name that is not registered
    pub fn invalid_command(session: &str, cmd: &str, args: Vec<String>) -> Self {
        let mut record = Self::base(session, Status::Error, cmd, args);
        record.error_type = Some(INVALID_COMMAND.to_string());
        record.error_value = Some(cmd.to_string());
        record
    }

    /// Create a note-mode record holding the raw text plus hook data
    pub fn note(session: &str, text: &str, extra: Map<String, Value>) -> Self {
        let mut record = Self::base(session, Status::Ok, NOTE_CMD, Vec::new());
        for (key, value) in extra {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                log::warn!("dropping note field that shadows a record field: {}", key);
                continue;
            }
            record.extra.insert(key, value);
        }
        record
            .extra
            .insert("user_input".to_string(), Value::String(text.to_string()));
        record
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Convert to the JSON mapping handed to the log sink
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Parse a record back out of a log sink mapping
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
