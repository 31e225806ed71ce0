//! Module: entity
//! Responsibility: the mapped object — scalar field state plus relation
//! proxies, bound one-to-one with a row of one table.
//! Does not own: persistence (all writes route through `Db`) or its own
//! lifecycle (the registry creates, caches, and deletes entities).
//!
//! Invariants:
//! - Field state holds every declared field from construction on;
//!   undeclared row columns are dropped.
//! - The relation map is built once at construction and never changes
//!   shape; only the proxies' cached state does.

use crate::{
    adapter::Row,
    db::relation::{Relation, RelationCollection, RelationRef},
    error::ErrorClass,
    model::EntityModel,
    value::Value,
};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt::{self, Debug, Display},
    rc::Rc,
};
use thiserror::Error as ThisError;

///
/// EntityError
///

#[derive(Debug, ThisError)]
pub enum EntityError {
    #[error("'{name}' is not a declared field or relation of '{type_name}'")]
    InvalidField {
        type_name: &'static str,
        name: String,
    },

    #[error("cannot write key field '{key}' of '{type_name}'; identity is immutable")]
    KeyFieldWrite {
        type_name: &'static str,
        key: &'static str,
    },

    #[error("'{name}' of '{type_name}' is a relation slot; it takes an entity, not a value")]
    RelationSlotScalar {
        type_name: &'static str,
        name: String,
    },

    #[error("relation '{name}' of '{type_name}' links type '{expected}', got '{found}'")]
    RemoteTypeMismatch {
        type_name: &'static str,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{name}' of '{type_name}' is a collection relation, not a single relation")]
    SingleExpected {
        type_name: &'static str,
        name: String,
    },

    #[error("'{name}' of '{type_name}' is a single relation, not a collection relation")]
    CollectionExpected {
        type_name: &'static str,
        name: String,
    },
}

impl EntityError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidField { .. } | Self::KeyFieldWrite { .. } => ErrorClass::InvalidField,
            Self::RelationSlotScalar { .. }
            | Self::RemoteTypeMismatch { .. }
            | Self::SingleExpected { .. }
            | Self::CollectionExpected { .. } => ErrorClass::TypeMismatch,
        }
    }
}

///
/// EntityHandle
///
/// Shared handle to one live entity. The identity map guarantees at most
/// one `Entity` allocation per (type, key); handles compare identical via
/// `Rc::ptr_eq` exactly when they name the same row.
///

pub type EntityHandle = Rc<Entity>;

///
/// Entity
///

pub struct Entity {
    model: &'static EntityModel,
    values: RefCell<BTreeMap<String, Value>>,
    relations: BTreeMap<&'static str, Relation>,
}

impl Entity {
    /// Build an entity from a backing row. Declared fields missing from the
    /// row default to null; undeclared row columns are dropped. Relation
    /// proxies receive a weak back-reference to the entity being built.
    pub(crate) fn materialize(model: &'static EntityModel, row: Row) -> EntityHandle {
        Rc::new_cyclic(|weak| {
            let mut values: BTreeMap<String, Value> = model
                .fields
                .iter()
                .map(|field| (field.name.to_string(), Value::Null))
                .collect();
            for (name, value) in row {
                if model.is_field(&name) {
                    values.insert(name, value);
                }
            }

            let mut relations = BTreeMap::new();
            for single in model.singles {
                relations.insert(
                    single.name,
                    Relation::Single(RelationRef::new(weak.clone(), single)),
                );
            }
            for multi in model.multis {
                relations.insert(
                    multi.name,
                    Relation::Multi(RelationCollection::new(weak.clone(), multi)),
                );
            }

            Self {
                model,
                values: RefCell::new(values),
                relations,
            }
        })
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        self.model
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.model.type_name
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.model.table
    }

    #[must_use]
    /// Name of the field carrying this entity's identity.
    pub const fn key(&self) -> &'static str {
        self.model.key
    }

    #[must_use]
    /// Current value of the key field.
    pub fn key_value(&self) -> Value {
        self.value_or_null(self.model.key)
    }

    #[must_use]
    /// Read one declared field. Returns `None` for undeclared names.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    #[must_use]
    pub(crate) fn value_or_null(&self, name: &str) -> Value {
        self.value(name).unwrap_or(Value::Null)
    }

    // In-memory write with no persistence; `Db` owns the write-through path.
    pub(crate) fn set_value_raw(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    #[must_use]
    /// Look up a relation proxy by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub(crate) fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Access a declared to-one relation proxy.
    pub fn single(&self, name: &str) -> Result<&RelationRef, EntityError> {
        match self.relations.get(name) {
            Some(Relation::Single(single)) => Ok(single),
            Some(Relation::Multi(_)) => Err(EntityError::SingleExpected {
                type_name: self.type_name(),
                name: name.to_string(),
            }),
            None => Err(EntityError::InvalidField {
                type_name: self.type_name(),
                name: name.to_string(),
            }),
        }
    }

    /// Access a declared to-many relation proxy.
    pub fn collection(&self, name: &str) -> Result<&RelationCollection, EntityError> {
        match self.relations.get(name) {
            Some(Relation::Multi(multi)) => Ok(multi),
            Some(Relation::Single(_)) => Err(EntityError::CollectionExpected {
                type_name: self.type_name(),
                name: name.to_string(),
            }),
            None => Err(EntityError::InvalidField {
                type_name: self.type_name(),
                name: name.to_string(),
            }),
        }
    }
}

// Relation proxies carry no printable state, so the diagnostic rendering
// is the Display one.
impl Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Entity {
    // Diagnostic print of the bound row; related entities are not included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.key_value())?;
        let values = self.values.borrow();
        let mut first = true;
        f.write_str(" {")?;
        for (name, value) in values.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
            first = false;
        }
        f.write_str("}")
    }
}
