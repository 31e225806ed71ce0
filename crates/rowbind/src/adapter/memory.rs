//! Module: adapter::memory
//! Responsibility: the in-memory reference backend.
//! Rows live in per-table insertion-ordered vectors; filters are evaluated
//! as equality-AND. Every CRUD call is appended to an operation journal so
//! tests can assert exactly which round trips the engine issued.
//!
//! Clones share state: the handle is `Rc`-backed, so a test can keep one
//! clone for seeding and journal inspection while the engine owns another.

use crate::{
    adapter::{AdapterError, Row, StorageAdapter},
    value::Value,
};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

///
/// Operation
/// One journaled adapter round trip, in call order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    FetchOne {
        table: String,
        key_field: String,
        key: Value,
    },
    FetchMany {
        table: String,
        filter: Row,
    },
    Insert {
        table: String,
        row: Row,
    },
    UpdateField {
        table: String,
        key_field: String,
        key: Value,
        field: String,
        value: Value,
    },
    DeleteOne {
        table: String,
        key_field: String,
        key: Value,
    },
    DeleteMany {
        table: String,
        filter: Row,
    },
    UpdateMany {
        table: String,
        filter: Row,
        values: Row,
    },
}

///
/// MemoryAdapter
///

#[derive(Clone, Default)]
pub struct MemoryAdapter {
    state: Rc<RefCell<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<Row>>,
    auto_keys: BTreeMap<String, AutoKey>,
    journal: Vec<Operation>,
}

struct AutoKey {
    field: String,
    next: u64,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable key generation for `table`: inserts that omit `key_field`
    /// (or carry it as null) receive the next counter value, starting at 1.
    pub fn auto_increment(&self, table: impl Into<String>, key_field: impl Into<String>) {
        self.state.borrow_mut().auto_keys.insert(
            table.into(),
            AutoKey {
                field: key_field.into(),
                next: 1,
            },
        );
    }

    /// Insert a row directly, bypassing the journal. Test seeding only.
    pub fn seed(&self, table: impl Into<String>, row: Row) {
        self.state
            .borrow_mut()
            .tables
            .entry(table.into())
            .or_default()
            .push(row);
    }

    /// Drain and return the journal of CRUD calls issued so far.
    pub fn take_journal(&self) -> Vec<Operation> {
        std::mem::take(&mut self.state.borrow_mut().journal)
    }

    #[must_use]
    /// Number of journaled CRUD calls issued so far.
    pub fn journal_len(&self) -> usize {
        self.state.borrow().journal.len()
    }

    #[must_use]
    /// Snapshot of every row currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .borrow()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn matches(row: &Row, filter: &Row) -> bool {
        filter
            .iter()
            .all(|(field, value)| row.get(field) == Some(value))
    }

    fn key_filter(key_field: &str, key: &Value) -> Row {
        Row::new().with(key_field, key.clone())
    }
}

impl StorageAdapter for MemoryAdapter {
    fn fetch_one(
        &self,
        table: &str,
        key_field: &str,
        key: &Value,
    ) -> Result<Option<Row>, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::FetchOne {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key: key.clone(),
        });

        let filter = Self::key_filter(key_field, key);
        Ok(state
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| Self::matches(row, &filter)))
            .cloned())
    }

    fn fetch_many(&self, table: &str, filter: &Row) -> Result<Vec<Row>, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::FetchMany {
            table: table.to_string(),
            filter: filter.clone(),
        });

        Ok(state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| Self::matches(row, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, table: &str, row: &Row) -> Result<Option<Value>, AdapterError> {
        let mut state = self.state.borrow_mut();

        let mut stored = row.clone();
        let mut generated = None;
        if let Some(auto) = state.auto_keys.get_mut(table) {
            let missing = stored.get(&auto.field).is_none_or(Value::is_null);
            if missing {
                let key = Value::Uint(auto.next);
                auto.next += 1;
                let field = auto.field.clone();
                stored.insert(field, key.clone());
                generated = Some(key);
            }
        }

        state.journal.push(Operation::Insert {
            table: table.to_string(),
            row: stored.clone(),
        });
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored);

        Ok(generated)
    }

    fn update_field(
        &self,
        table: &str,
        key_field: &str,
        key: &Value,
        field: &str,
        value: &Value,
    ) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::UpdateField {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key: key.clone(),
            field: field.to_string(),
            value: value.clone(),
        });

        let filter = Self::key_filter(key_field, key);
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| Self::matches(row, &filter)) {
                row.insert(field.to_string(), value.clone());
            }
        }
        Ok(())
    }

    fn delete_one(&self, table: &str, key_field: &str, key: &Value) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::DeleteOne {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key: key.clone(),
        });

        let filter = Self::key_filter(key_field, key);
        if let Some(rows) = state.tables.get_mut(table) {
            if let Some(pos) = rows.iter().position(|row| Self::matches(row, &filter)) {
                rows.remove(pos);
            }
        }
        Ok(())
    }

    fn delete_many(&self, table: &str, filter: &Row) -> Result<u64, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::DeleteMany {
            table: table.to_string(),
            filter: filter.clone(),
        });

        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !Self::matches(row, filter));

        Ok((before - rows.len()) as u64)
    }

    fn update_many(
        &self,
        table: &str,
        filter: &Row,
        values: &Row,
    ) -> Result<u64, AdapterError> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Operation::UpdateMany {
            table: table.to_string(),
            filter: filter.clone(),
            values: values.clone(),
        });

        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let mut touched = 0u64;
        for row in rows.iter_mut().filter(|row| Self::matches(row, filter)) {
            for (field, value) in values.iter() {
                row.insert(field.clone(), value.clone());
            }
            touched += 1;
        }

        Ok(touched)
    }

    // No query language to protect against; values pass through unchanged.
    fn escape(&self, value: &Value) -> Value {
        value.clone()
    }
}
