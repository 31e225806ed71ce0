//! Module: adapter
//! Responsibility: the storage boundary contract. Rows go in, rows come out.
//! Does not own: identity, schema metadata, or relationship semantics.
//! Boundary: everything below this trait is backend glue; escaping and
//! injection safety belong entirely to the adapter, never to the engine.

pub mod memory;

pub use memory::{MemoryAdapter, Operation};

use crate::value::Value;
use derive_more::{Deref, DerefMut, IntoIterator};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// AdapterError
///
/// Backend failure surfaced unchanged to the triggering call. The engine
/// never retries; transient-failure policy belongs to the adapter.
///

#[derive(Debug, ThisError)]
#[error("storage adapter failure: {message}")]
pub struct AdapterError {
    pub message: String,
}

impl AdapterError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// Row
///
/// Insertion-ordered field-name → value mapping. Serves as one backend
/// row, one equality-AND filter, or one set of update values.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, IntoIterator, Eq, PartialEq, Serialize, Deserialize,
)]
pub struct Row(IndexMap<String, Value>);

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Builder-style insert, for concise filter and seed construction.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// StorageAdapter
///
/// Narrow row-oriented CRUD contract the engine consumes. Filters are
/// equality-AND mappings; a row that matches every (field, value) pair of
/// the filter is selected. Implementations take `&self` and manage their
/// own interior state; the engine is single-actor and never calls
/// concurrently.
///

pub trait StorageAdapter {
    /// Fetch the row whose `key_field` equals `key`, if any.
    fn fetch_one(
        &self,
        table: &str,
        key_field: &str,
        key: &Value,
    ) -> Result<Option<Row>, AdapterError>;

    /// Fetch every row matching `filter`, in backend iteration order.
    fn fetch_many(&self, table: &str, filter: &Row) -> Result<Vec<Row>, AdapterError>;

    /// Insert one row. Returns the generated key when the backend produced
    /// one, `None` otherwise.
    fn insert(&self, table: &str, row: &Row) -> Result<Option<Value>, AdapterError>;

    /// Update exactly one field of the row whose `key_field` equals `key`.
    fn update_field(
        &self,
        table: &str,
        key_field: &str,
        key: &Value,
        field: &str,
        value: &Value,
    ) -> Result<(), AdapterError>;

    /// Delete the row whose `key_field` equals `key`.
    fn delete_one(&self, table: &str, key_field: &str, key: &Value) -> Result<(), AdapterError>;

    /// Delete every row matching `filter`; returns the count removed.
    fn delete_many(&self, table: &str, filter: &Row) -> Result<u64, AdapterError>;

    /// Merge `values` into every row matching `filter`; returns the count
    /// touched.
    fn update_many(&self, table: &str, filter: &Row, values: &Row)
    -> Result<u64, AdapterError>;

    /// Sanitize one value for inclusion in the backend's query language.
    fn escape(&self, value: &Value) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_preserves_insertion_order() {
        let row = Row::new()
            .with("zeta", 1_i64)
            .with("alpha", 2_i64)
            .with("mu", 3_i64);

        let names: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mu"]);
    }

    #[test]
    fn row_serializes_as_a_json_object() {
        let row = Row::new().with("event_id", 7_u64).with("title", "gala");

        let json = serde_json::to_string(&row).expect("row should serialize");
        assert_eq!(json, r#"{"event_id":{"Uint":7},"title":{"Text":"gala"}}"#);

        let back: Row = serde_json::from_str(&json).expect("row should deserialize");
        assert_eq!(back, row);
    }
}
