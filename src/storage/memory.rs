//! In-memory log sink for ephemeral sessions and tests.

use std::collections::HashMap;

use serde_json::Value;

use super::traits::{Filter, LogSink, keep_recent};
use crate::error::Result;

#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    collections: HashMap<String, Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record appended to `collection`, oldest first
    pub fn records(&self, collection: &str) -> &[Value] {
        self.collections.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of records across collections
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, collection: &str, record: Value) -> Result<()> {
        self.collections.entry(collection.to_string()).or_default().push(record);
        Ok(())
    }

    fn query(&mut self, collection: &str, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>> {
        let matched = self
            .records(collection)
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        Ok(keep_recent(matched, limit))
    }
}
