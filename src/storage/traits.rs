//! Log sink trait and record filters.

use serde_json::Value;

use super::template::render;
use crate::error::Result;

/// Filter operations for querying records.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Field equals value
    Eq,
    /// Field does not equal value
    Ne,
    /// Field contains value (substring or array element)
    Contains,
}

/// A predicate on one record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    pub op: FilterOp,
    /// Value to compare against
    pub value: Value,
}

impl Filter {
    fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Ne, value)
    }

    /// Create a contains filter.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Contains, value)
    }

    /// The string an indexed store can look up directly, if any.
    pub fn exact_str(&self) -> Option<&str> {
        match (&self.op, &self.value) {
            (FilterOp::Eq, Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Check if a record matches this filter.
    pub fn matches(&self, record: &Value) -> bool {
        let field = record.get(&self.field);
        match self.op {
            FilterOp::Eq => field.map_or(self.value.is_null(), |v| *v == self.value),
            FilterOp::Ne => field.map_or(!self.value.is_null(), |v| *v != self.value),
            FilterOp::Contains => match (field, &self.value) {
                (Some(Value::String(haystack)), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Some(Value::Array(items)), needle) => items.contains(needle),
                _ => false,
            },
        }
    }
}

/// Append-only structured record store with field queries.
///
/// Collections partition records; the loop uses one collection per session
/// for invocation records and another for wishes. Query results are in
/// append order.
pub trait LogSink {
    /// Append one record to a collection.
    fn append(&mut self, collection: &str, record: Value) -> Result<()>;

    /// Records matching every filter, oldest first. With a `limit`, only the
    /// most recent `limit` matches are returned (still oldest first).
    fn query(&mut self, collection: &str, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>>;

    /// Query and render each match through a `{field}` template.
    fn find(
        &mut self,
        collection: &str,
        filters: &[Filter],
        template: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let records = self.query(collection, filters, limit)?;
        Ok(records.iter().map(|r| render(template, r)).collect())
    }
}

/// Keep the most recent `limit` records, preserving order.
pub(crate) fn keep_recent(mut records: Vec<Value>, limit: Option<usize>) -> Vec<Value> {
    if let Some(limit) = limit
        && records.len() > limit
    {
        records.drain(..records.len() - limit);
    }
    records
}
