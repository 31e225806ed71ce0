//! Module: db
//! Responsibility: the identity map and the routing of every row-level
//! round trip — entity rows and association rows alike.
//! Does not own: backend query building (adapter glue) or schema
//! declaration (the `SchemaRegistry` is consumed, not defined, here).
//!
//! Invariants:
//! - At most one live entity per (type name, key value); all construction
//!   paths go through the cache.
//! - Every mutating operation performs exactly one synchronous adapter
//!   round trip before returning.
//! - The cache never evicts except on explicit delete.

pub mod entity;
pub mod relation;


pub use entity::{Entity, EntityError, EntityHandle};
pub use relation::{AssocEntry, ENTITY_SLOT, Relation, RelationCollection, RelationRef};

use crate::{
    adapter::{Row, StorageAdapter},
    error::{Error, ErrorClass},
    obs::metrics::{self, ExecKind},
    schema::SchemaRegistry,
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};
use thiserror::Error as ThisError;

///
/// RegistryError
/// Registry-level invariant failures. None of these are recoverable by
/// retrying the triggering call.
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("insert into '{table}' produced no usable key for type '{type_name}'")]
    MissingInsertKey {
        type_name: &'static str,
        table: &'static str,
    },

    #[error("freshly created '{type_name}' row with key {key} could not be reloaded")]
    CreateLookupFailed {
        type_name: &'static str,
        key: Value,
    },

    #[error("row in '{table}' is missing its key column '{column}'")]
    MissingKeyColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        ErrorClass::Internal
    }
}

///
/// Db
///
/// One unit of work over one storage adapter: an explicit identity map
/// plus the write-through persistence paths. Scope a `Db` to a single
/// logical actor and discard it when the unit of work ends; two registries
/// over the same backing store diverge silently by design.
///

pub struct Db {
    schemas: SchemaRegistry,
    adapter: Box<dyn StorageAdapter>,
    cache: RefCell<HashMap<(&'static str, Value), EntityHandle>>,
}

impl Db {
    #[must_use]
    pub fn new(schemas: SchemaRegistry, adapter: impl StorageAdapter + 'static) -> Self {
        Self {
            schemas,
            adapter: Box::new(adapter),
            cache: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    #[must_use]
    /// Direct access to the storage boundary (e.g. for `escape`).
    pub fn adapter(&self) -> &dyn StorageAdapter {
        self.adapter.as_ref()
    }

    #[must_use]
    /// Number of live entities in the identity map.
    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Fetch the entity of `type_name` identified by `key`. A cache hit
    /// returns the canonical live instance; otherwise the row is loaded and
    /// a new entity is constructed and cached. No matching row is a soft
    /// miss: `Ok(None)`, never an error.
    pub fn get(&self, type_name: &str, key: &Value) -> Result<Option<EntityHandle>, Error> {
        let model = self.schemas.try_get(type_name)?;

        if let Some(hit) = self.cache.borrow().get(&(model.type_name, key.clone())) {
            return Ok(Some(hit.clone()));
        }

        metrics::record(ExecKind::FetchOne);
        let Some(row) = self.adapter.fetch_one(model.table, model.key, key)? else {
            return Ok(None);
        };

        let entity = Entity::materialize(model, row);
        self.cache
            .borrow_mut()
            .insert((model.type_name, key.clone()), entity.clone());

        Ok(Some(entity))
    }

    /// Insert a new row and resolve it through [`Self::get`], so the
    /// returned instance is also the canonical cached one. The key comes
    /// from the adapter's generated key, falling back to the key field of
    /// `initial`.
    pub fn create(&self, type_name: &str, initial: Row) -> Result<EntityHandle, Error> {
        let model = self.schemas.try_get(type_name)?;

        metrics::record(ExecKind::Insert);
        let generated = self.adapter.insert(model.table, &initial)?;

        let key = generated
            .filter(|key| !key.is_null())
            .or_else(|| initial.get(model.key).cloned().filter(|key| !key.is_null()))
            .ok_or(RegistryError::MissingInsertKey {
                type_name: model.type_name,
                table: model.table,
            })?;

        self.get(type_name, &key)?
            .ok_or_else(|| {
                RegistryError::CreateLookupFailed {
                    type_name: model.type_name,
                    key,
                }
                .into()
            })
    }

    /// Write one scalar field: validate, update the in-memory value, then
    /// persist exactly that field. Relation names reject scalar writes;
    /// the key field is immutable.
    pub fn set_field(&self, entity: &Entity, name: &str, value: Value) -> Result<(), Error> {
        let model = entity.model();
        if model.is_relation(name) {
            return Err(EntityError::RelationSlotScalar {
                type_name: model.type_name,
                name: name.to_string(),
            }
            .into());
        }
        if !model.is_field(name) {
            return Err(EntityError::InvalidField {
                type_name: model.type_name,
                name: name.to_string(),
            }
            .into());
        }
        if name == model.key {
            return Err(EntityError::KeyFieldWrite {
                type_name: model.type_name,
                key: model.key,
            }
            .into());
        }

        entity.set_value_raw(name, value);
        self.persist_field(entity, name)
    }

    /// Persist the current in-memory value of one field: a single
    /// `update_field` round trip keyed by the entity's identity.
    pub fn persist_field(&self, entity: &Entity, field: &str) -> Result<(), Error> {
        let model = entity.model();
        if !model.is_field(field) {
            return Err(EntityError::InvalidField {
                type_name: model.type_name,
                name: field.to_string(),
            }
            .into());
        }
        if field == model.key {
            return Err(EntityError::KeyFieldWrite {
                type_name: model.type_name,
                key: model.key,
            }
            .into());
        }

        metrics::record(ExecKind::Update);
        self.adapter.update_field(
            model.table,
            model.key,
            &entity.key_value(),
            field,
            &entity.value_or_null(field),
        )?;
        Ok(())
    }

    /// Assign a to-one relation: type-check the remote, update the proxy,
    /// and — when the linkage is stored locally — mirror the remote's key
    /// into the local foreign-key field and persist it.
    pub fn set_related(
        &self,
        owner: &EntityHandle,
        name: &str,
        remote: Option<&EntityHandle>,
    ) -> Result<(), Error> {
        let single = owner.single(name)?;
        let model = single.model();

        if let Some(remote) = remote {
            if remote.type_name() != model.remote_type {
                return Err(EntityError::RemoteTypeMismatch {
                    type_name: owner.type_name(),
                    name: name.to_string(),
                    expected: model.remote_type,
                    found: remote.type_name(),
                }
                .into());
            }
        }

        single.set(remote.cloned());

        if model.local_link {
            let link = single.link_value();
            self.set_field(owner, model.local_key, link)?;
        }

        Ok(())
    }

    /// Delete an entity: tear relations down first (so no dangling foreign
    /// keys survive in backends that enforce them), then delete the row,
    /// then evict the cache entry. The handle is consumed; other
    /// outstanding handles must be dropped by their holders.
    pub fn delete(&self, entity: EntityHandle) -> Result<(), Error> {
        let key = entity.key_value();
        self.teardown(&entity)?;

        metrics::record(ExecKind::Delete);
        self.adapter.delete_one(entity.table(), entity.key(), &key)?;

        self.cache.borrow_mut().remove(&(entity.type_name(), key));
        Ok(())
    }

    /// Fetch every row of the type's table, resolving each through
    /// [`Self::get`]. Backend order is preserved; duplicate keys resolve to
    /// the one cached instance and appear once.
    pub fn list_all(&self, type_name: &str) -> Result<Vec<EntityHandle>, Error> {
        let model = self.schemas.try_get(type_name)?;

        metrics::record(ExecKind::FetchMany);
        let rows = self.adapter.fetch_many(model.table, &Row::new())?;

        let mut seen: HashSet<Value> = HashSet::with_capacity(rows.len());
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row
                .get(model.key)
                .cloned()
                .ok_or(RegistryError::MissingKeyColumn {
                    table: model.table,
                    column: model.key,
                })?;
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Some(entity) = self.get(type_name, &key)? {
                entities.push(entity);
            }
        }

        Ok(entities)
    }

    // --- association-row operations, used by RelationCollection ---
    // Parameters are (column, value) pairs and filters, never entities.

    /// Insert one association row: the extra properties plus the local and
    /// remote key columns.
    pub fn add_association(
        &self,
        table: &str,
        local: (&str, &Value),
        remote: (&str, &Value),
        properties: &Row,
    ) -> Result<(), Error> {
        let mut row = properties.clone();
        row.insert(local.0.to_string(), local.1.clone());
        row.insert(remote.0.to_string(), remote.1.clone());

        metrics::record(ExecKind::Insert);
        self.adapter.insert(table, &row)?;
        Ok(())
    }

    /// Fetch association (or foreign-keyed remote) rows matching `filter`.
    pub fn fetch_associations(&self, table: &str, filter: &Row) -> Result<Vec<Row>, Error> {
        metrics::record(ExecKind::FetchMany);
        Ok(self.adapter.fetch_many(table, filter)?)
    }

    /// Delete association rows matching `filter`; returns the count.
    pub fn remove_associations(&self, table: &str, filter: &Row) -> Result<u64, Error> {
        metrics::record(ExecKind::Delete);
        Ok(self.adapter.delete_many(table, filter)?)
    }

    /// Merge `values` into association rows matching `filter`; returns the
    /// count touched.
    pub fn update_associations(
        &self,
        table: &str,
        filter: &Row,
        values: &Row,
    ) -> Result<u64, Error> {
        metrics::record(ExecKind::Update);
        Ok(self.adapter.update_many(table, filter, values)?)
    }

    // Relation teardown, delete-path only. Singles clear their local link;
    // collections remove every member (loading first, so unloaded
    // collections still clean up their backing rows). There is no rollback:
    // a failure mid-teardown leaves relations partially severed with the
    // row still present.
    fn teardown(&self, entity: &EntityHandle) -> Result<(), Error> {
        for rel in entity.relations() {
            match rel {
                Relation::Single(single) => {
                    if single.model().local_link {
                        self.set_field(entity, single.model().local_key, Value::Null)?;
                    }
                    single.clear();
                }
                Relation::Multi(multi) => {
                    let members = multi.get_all(self)?;
                    for entry in members.values() {
                        multi.remove(self, &entry.entity)?;
                    }
                    multi.clear();
                }
            }
        }
        Ok(())
    }
}
