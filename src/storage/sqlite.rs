//! SQLite-backed log sink.
//!
//! Records are stored whole as JSON; `cmd`, `status`, `error_type` and `ch`
//! are copied into indexed columns so the common `field:value` queries do not
//! scan every record. Other filters are applied after decoding.

use std::path::Path;

use rusqlite::{Connection, params, params_from_iter};
use serde_json::Value;

use super::traits::{Filter, LogSink, keep_recent};
use crate::error::{ChloopError, Result};

/// Record fields mirrored into indexed columns
pub const INDEXED_FIELDS: &[&str] = &["cmd", "status", "error_type", "ch"];

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    cmd        TEXT,
    status     TEXT,
    error_type TEXT,
    ch         TEXT,
    body       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_cmd ON records(collection, cmd);
CREATE INDEX IF NOT EXISTS idx_records_status ON records(collection, status);
CREATE INDEX IF NOT EXISTS idx_records_error_type ON records(collection, error_type);
CREATE INDEX IF NOT EXISTS idx_records_ch ON records(collection, ch);
";

fn storage_err(e: rusqlite::Error) -> ChloopError {
    ChloopError::Storage(e.to_string())
}

pub struct SqliteSink {
    conn: Connection,
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink").finish_non_exhaustive()
    }
}

impl SqliteSink {
    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::with_connection(conn)
    }

    /// Non-persistent database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(Self { conn })
    }
}

fn indexed_column(record: &Value, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_string)
}

impl LogSink for SqliteSink {
    fn append(&mut self, collection: &str, record: Value) -> Result<()> {
        let body = serde_json::to_string(&record)?;
        self.conn
            .execute(
                "INSERT INTO records (collection, cmd, status, error_type, ch, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    collection,
                    indexed_column(&record, "cmd"),
                    indexed_column(&record, "status"),
                    indexed_column(&record, "error_type"),
                    indexed_column(&record, "ch"),
                    body,
                ],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn query(&mut self, collection: &str, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>> {
        let mut sql = String::from("SELECT body FROM records WHERE collection = ?1");
        let mut bind: Vec<String> = vec![collection.to_string()];
        let mut residual: Vec<&Filter> = Vec::new();

        for filter in filters {
            match filter.exact_str() {
                Some(value) if INDEXED_FIELDS.contains(&filter.field.as_str()) => {
                    bind.push(value.to_string());
                    sql.push_str(&format!(" AND {} = ?{}", filter.field, bind.len()));
                }
                _ => residual.push(filter),
            }
        }
        sql.push_str(" ORDER BY seq ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| row.get::<_, String>(0))
            .map_err(storage_err)?;

        let mut matched = Vec::new();
        for row in rows {
            let record: Value = serde_json::from_str(&row.map_err(storage_err)?)?;
            if residual.iter().all(|f| f.matches(&record)) {
                matched.push(record);
            }
        }

        Ok(keep_recent(matched, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_query_indexed() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.append("log", json!({"cmd": "echo", "status": "ok", "args": ["a"]})).unwrap();
        sink.append("log", json!({"cmd": "boom", "status": "error", "error_type": "panic"})).unwrap();

        let errors = sink.query("log", &[Filter::eq("status", "error")], None).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["cmd"], "boom");

        let panics = sink.query("log", &[Filter::eq("error_type", "panic")], None).unwrap();
        assert_eq!(panics.len(), 1);
    }

    #[test]
    fn test_query_residual_filters() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.append("log", json!({"cmd": "echo", "status": "ok", "args": ["a", "b"]})).unwrap();
        sink.append("log", json!({"cmd": "echo", "status": "ok", "args": ["c"]})).unwrap();

        let filters = [Filter::eq("cmd", "echo"), Filter::contains("args", "b")];
        let matched = sink.query("log", &filters, None).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["args"], json!(["a", "b"]));
    }

    #[test]
    fn test_collections_are_partitioned() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.append("a", json!({"cmd": "x"})).unwrap();
        sink.append("b", json!({"cmd": "x"})).unwrap();
        assert_eq!(sink.query("a", &[], None).unwrap().len(), 1);
    }

    #[test]
    fn test_order_and_limit() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        for n in 0..4 {
            sink.append("log", json!({"status": "ok", "n": n})).unwrap();
        }
        let recent = sink.query("log", &[Filter::eq("status", "ok")], Some(2)).unwrap();
        assert_eq!(recent[0]["n"], 2);
        assert_eq!(recent[1]["n"], 3);
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("chloop.db");
        {
            let mut sink = SqliteSink::open(&path).unwrap();
            sink.append("log", json!({"cmd": "echo"})).unwrap();
        }
        let mut sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.query("log", &[Filter::eq("cmd", "echo")], None).unwrap().len(), 1);
    }
}
