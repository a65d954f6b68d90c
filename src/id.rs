//! Clock and ID helpers
//!
//! Every record carries both an epoch timestamp and a human-readable one.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Render an epoch-millis timestamp in local time
///
/// Format: `2026-01-31 14:05:09.123`
pub fn format_timestamp(ms: u64) -> String {
    match Local.timestamp_millis_opt(ms as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => ms.to_string(),
    }
}

/// Generate a record ID
///
/// Format: `{timestamp_ms}-{sequence_hex}`
/// Example: `1738300800123-002a`
pub fn generate_record_id(ts: u64) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xffff;
    format!("{}-{:04x}", ts, seq)
}
