//! Wishlist records: keys and commands the user expected to do something.

use serde::{Deserialize, Serialize};

use crate::id::{format_timestamp, generate_record_id, now_ms};

/// A wish for an unbound key or an unknown command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishRecord {
    pub id: String,
    pub session: String,
    /// Key the wish is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ch: Option<String>,
    /// Command the wish is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// What the user wished would happen
    pub message: String,
    pub epoch_ms: u64,
    pub timestamp: String,
}

impl WishRecord {
    fn new(session: &str, ch: Option<String>, cmd: Option<String>, message: &str) -> Self {
        let ts = now_ms();
        Self {
            id: generate_record_id(ts),
            session: session.to_string(),
            ch,
            cmd,
            message: message.to_string(),
            epoch_ms: ts,
            timestamp: format_timestamp(ts),
        }
    }

    /// Wish for a key press
    pub fn for_key(session: &str, ch: &str, message: &str) -> Self {
        Self::new(session, Some(ch.to_string()), None, message)
    }

    /// Wish for a colon command
    pub fn for_command(session: &str, cmd: &str, message: &str) -> Self {
        Self::new(session, None, Some(cmd.to_string()), message)
    }
}
