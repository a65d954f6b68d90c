//! Log sink layer - where invocation records and wishes are persisted.
//!
//! The dispatch loop only needs "append record" and "query records matching a
//! field predicate, formatted". Three sinks implement that:
//! - `JsonlSink`: one append-only JSONL file per collection (default)
//! - `SqliteSink`: a single database with indexed `cmd`/`status`/`error_type`
//! - `MemorySink`: nothing persisted

mod jsonl;
mod memory;
mod sqlite;
mod template;
mod traits;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use sqlite::{INDEXED_FIELDS, SqliteSink};
pub use template::render;
pub use traits::{Filter, FilterOp, LogSink};

use crate::error::Result;

/// Collection holding a session's invocation records
pub fn log_collection(session: &str) -> String {
    format!("chloop-log--{}", session)
}

/// Collection holding a session's wishes
pub fn wish_collection(session: &str) -> String {
    format!("chloop-wish--{}", session)
}

/// Which sink implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Jsonl,
    Sqlite,
    Memory,
}

/// Open the configured sink under `dir`.
pub fn open_sink(backend: Backend, dir: &Path) -> Result<Box<dyn LogSink>> {
    let sink: Box<dyn LogSink> = match backend {
        Backend::Jsonl => Box::new(JsonlSink::open(dir)?),
        Backend::Sqlite => Box::new(SqliteSink::open(dir.join("chloop.db"))?),
        Backend::Memory => Box::new(MemorySink::new()),
    };
    log::info!("Opened {:?} log sink at {}", backend, dir.display());
    Ok(sink)
}
