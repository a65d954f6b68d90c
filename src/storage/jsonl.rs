//! JSONL-backed log sink with an in-memory cache.
//!
//! Each collection is one append-only `{collection}.jsonl` file.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::traits::{Filter, LogSink, keep_recent};
use crate::error::Result;

/// JSONL log sink; the file is the source of truth, the cache avoids rereads.
pub struct JsonlSink {
    base_path: PathBuf,
    cache: HashMap<String, Vec<Value>>,
}

impl JsonlSink {
    /// Open a sink rooted at `base_path`, creating the directory if needed.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            cache: HashMap::new(),
        })
    }

    /// Get the file path for a collection.
    ///
    /// Bytes outside `[A-Za-z0-9_-]` are written as `%XX`, so distinct
    /// collections never share a file.
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        let mut safe = String::with_capacity(collection.len());
        for byte in collection.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                safe.push(byte as char);
            } else {
                safe.push_str(&format!("%{:02X}", byte));
            }
        }
        self.base_path.join(format!("{}.jsonl", safe))
    }

    fn load(&mut self, collection: &str) -> Result<&mut Vec<Value>> {
        if !self.cache.contains_key(collection) {
            let path = self.collection_path(collection);
            let mut records = Vec::new();
            if path.exists() {
                let reader = BufReader::new(File::open(&path)?);
                for (lineno, line) in reader.lines().enumerate() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(&line) {
                        Ok(record) => records.push(record),
                        Err(e) => log::warn!("skipping corrupt line {} in {}: {}", lineno + 1, path.display(), e),
                    }
                }
            }
            log::debug!("loaded {} records from {}", records.len(), path.display());
            self.cache.insert(collection.to_string(), records);
        }
        Ok(self.cache.entry(collection.to_string()).or_default())
    }
}

impl LogSink for JsonlSink {
    fn append(&mut self, collection: &str, record: Value) -> Result<()> {
        let path = self.collection_path(collection);
        let records = self.load(collection)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;

        records.push(record);
        Ok(())
    }

    fn query(&mut self, collection: &str, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>> {
        let records = self.load(collection)?;
        let matched = records
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        Ok(keep_recent(matched, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_sink() -> (JsonlSink, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonlSink::open(temp_dir.path()).unwrap();
        (sink, temp_dir)
    }

    #[test]
    fn test_append_and_query() {
        let (mut sink, _temp) = create_test_sink();
        sink.append("log", json!({"cmd": "echo", "status": "ok"})).unwrap();
        sink.append("log", json!({"cmd": "boom", "status": "error"})).unwrap();
        sink.append("log", json!({"cmd": "echo", "status": "ok"})).unwrap();

        let ok = sink.query("log", &[Filter::eq("status", "ok")], None).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok.iter().all(|r| r["cmd"] == "echo"));
    }

    #[test]
    fn test_query_limit_keeps_most_recent() {
        let (mut sink, _temp) = create_test_sink();
        for n in 0..5 {
            sink.append("log", json!({"n": n})).unwrap();
        }
        let recent = sink.query("log", &[], Some(2)).unwrap();
        assert_eq!(recent, vec![json!({"n": 3}), json!({"n": 4})]);
    }

    #[test]
    fn test_empty_collection() {
        let (mut sink, _temp) = create_test_sink();
        assert!(sink.query("empty", &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut sink = JsonlSink::open(temp_dir.path()).unwrap();
            sink.append("log", json!({"cmd": "echo"})).unwrap();
        }
        {
            let mut sink = JsonlSink::open(temp_dir.path()).unwrap();
            let all = sink.query("log", &[], None).unwrap();
            assert_eq!(all.len(), 1);
            assert_eq!(all[0]["cmd"], "echo");
        }
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonlSink::open(temp_dir.path()).unwrap();
        fs::write(sink.collection_path("log"), "{\"cmd\":\"a\"}\nnot json\n\n{\"cmd\":\"b\"}\n").unwrap();

        let mut sink = JsonlSink::open(temp_dir.path()).unwrap();
        let all = sink.query("log", &[], None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_collections_are_separate_files() {
        let (mut sink, temp) = create_test_sink();
        sink.append("chloop-log--alpha", json!({"cmd": "a"})).unwrap();
        sink.append("chloop-log--beta", json!({"cmd": "b"})).unwrap();

        assert!(temp.path().join("chloop-log--alpha.jsonl").exists());
        assert!(temp.path().join("chloop-log--beta.jsonl").exists());
        assert_eq!(sink.query("chloop-log--alpha", &[], None).unwrap().len(), 1);
    }

    #[test]
    fn test_collection_path_is_escaped() {
        let (sink, temp) = create_test_sink();
        assert_eq!(sink.collection_path("a/b c"), temp.path().join("a%2Fb%20c.jsonl"));
        assert_eq!(sink.collection_path("a_b-c"), temp.path().join("a_b-c.jsonl"));
        assert_eq!(sink.collection_path("é"), temp.path().join("%C3%A9.jsonl"));
    }

    #[test]
    fn test_similar_names_do_not_share_a_file() {
        let (mut sink, temp) = create_test_sink();
        sink.append("chloop-log--work/a", json!({"cmd": "secret"})).unwrap();
        assert_ne!(sink.collection_path("chloop-log--work/a"), sink.collection_path("chloop-log--work_a"));
        assert!(sink.query("chloop-log--work_a", &[], None).unwrap().is_empty());

        let mut reopened = JsonlSink::open(temp.path()).unwrap();
        assert!(reopened.query("chloop-log--work_a", &[], None).unwrap().is_empty());
        assert_eq!(reopened.query("chloop-log--work/a", &[], None).unwrap().len(), 1);
    }

    #[test]
    fn test_find_renders_template() {
        let (mut sink, _temp) = create_test_sink();
        sink.append("log", json!({"cmd": "echo", "status": "ok"})).unwrap();
        let lines = sink.find("log", &[], "cmd={cmd} status={status}", None).unwrap();
        assert_eq!(lines, vec!["cmd=echo status=ok"]);
    }
}
