//! Module: relation::collection
//! Responsibility: the to-many relationship proxy (one-to-many and
//! many-to-many), including per-association properties for many-to-many
//! links.
//!
//! Invariants:
//! - The cache maps remote-key-value → association entry, in insertion
//!   order of the most recent load.
//! - The reserved entity slot name never appears among association
//!   properties; violating calls fail before any storage round trip.
//! - One-to-many staleness is coarse: one stale member invalidates and
//!   reloads the whole collection.

use crate::{
    adapter::Row,
    db::{
        Db,
        entity::{Entity, EntityHandle},
        relation::RelationError,
    },
    error::Error,
    model::MultiModel,
    value::Value,
};
use indexmap::IndexMap;
use std::{cell::RefCell, rc::Weak};

/// Reserved association-property name holding the resolved remote entity.
pub const ENTITY_SLOT: &str = "entity";

///
/// AssocEntry
/// One collection member: the extra association properties plus the
/// resolved remote entity.
///

#[derive(Clone)]
pub struct AssocEntry {
    pub properties: Row,
    pub entity: EntityHandle,
}

///
/// RelationCollection
///

pub struct RelationCollection {
    owner: Weak<Entity>,
    model: &'static MultiModel,
    state: RefCell<CollectionState>,
}

#[derive(Default)]
struct CollectionState {
    loaded: bool,
    entries: IndexMap<Value, AssocEntry>,
}

impl RelationCollection {
    pub(crate) fn new(owner: Weak<Entity>, model: &'static MultiModel) -> Self {
        Self {
            owner,
            model,
            state: RefCell::new(CollectionState::default()),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &'static MultiModel {
        self.model
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    /// Snapshot of every member, keyed by remote key value, in the
    /// insertion order of the most recent load. Loads first if needed.
    pub fn get_all(&self, db: &Db) -> Result<IndexMap<Value, AssocEntry>, Error> {
        self.ensure_loaded(db)?;

        Ok(self.state.borrow().entries.clone())
    }

    /// Fetch one member by remote key value. For one-to-many relations a
    /// cached member whose foreign key no longer points at the owner
    /// invalidates the whole cache, which is reloaded before answering.
    pub fn get(&self, db: &Db, id: &Value) -> Result<Option<EntityHandle>, Error> {
        if self.is_loaded() {
            if self.model.is_one_to_many() && self.is_stale(id)? {
                self.load(db)?;
            }
        } else {
            self.load(db)?;
        }

        Ok(self
            .state
            .borrow()
            .entries
            .get(id)
            .map(|entry| entry.entity.clone()))
    }

    /// Associate `remote` with the owner, with optional association
    /// properties. Returns false (no-op) when already a member.
    pub fn add(&self, db: &Db, remote: &EntityHandle, properties: Row) -> Result<bool, Error> {
        self.reject_reserved(&properties)?;
        self.check_remote(remote)?;
        let id = self.member_key(remote);
        if id.is_null() {
            return Err(RelationError::MissingKey {
                relation: self.model.name,
                field: self.member_key_field(db)?,
            }
            .into());
        }

        self.ensure_loaded(db)?;
        if self.state.borrow().entries.contains_key(&id) {
            return Ok(false);
        }

        self.state.borrow_mut().entries.insert(
            id.clone(),
            AssocEntry {
                properties: properties.clone(),
                entity: remote.clone(),
            },
        );

        let owner = self.owner()?;
        if let Some(table) = self.model.assoc_table {
            db.add_association(
                table,
                (self.model.local_key, &owner.value_or_null(self.model.local_key)),
                (self.model.remote_key, &id),
                &properties,
            )?;
        } else {
            let local = owner.value_or_null(self.model.local_key);
            db.set_field(remote, self.model.remote_key, local)?;
        }

        Ok(true)
    }

    /// Dissociate `remote` from the owner. Returns false when it was not a
    /// member. One-to-many clears the remote's foreign key; many-to-many
    /// deletes the matching association rows.
    pub fn remove(&self, db: &Db, remote: &EntityHandle) -> Result<bool, Error> {
        self.check_remote(remote)?;
        self.ensure_loaded(db)?;

        let id = self.member_key(remote);
        if !self.state.borrow().entries.contains_key(&id) {
            return Ok(false);
        }

        if let Some(table) = self.model.assoc_table {
            let owner = self.owner()?;
            let filter = Row::new()
                .with(self.model.local_key, owner.value_or_null(self.model.local_key))
                .with(self.model.remote_key, id.clone());
            db.remove_associations(table, &filter)?;
        } else {
            db.set_field(remote, self.model.remote_key, Value::Null)?;
        }

        self.state.borrow_mut().entries.shift_remove(&id);
        Ok(true)
    }

    /// Merge new association properties into an existing membership.
    /// Returns false when `remote` is not a member. Many-to-many persists
    /// through an association-row update keyed by (local key, remote key);
    /// one-to-many has no association row, so the merge is cache-only.
    pub fn update(&self, db: &Db, remote: &EntityHandle, properties: Row) -> Result<bool, Error> {
        self.reject_reserved(&properties)?;
        self.check_remote(remote)?;
        self.ensure_loaded(db)?;

        let id = self.member_key(remote);
        {
            let mut state = self.state.borrow_mut();
            let Some(entry) = state.entries.get_mut(&id) else {
                return Ok(false);
            };
            for (field, value) in properties.iter() {
                entry.properties.insert(field.clone(), value.clone());
            }
        }

        if let Some(table) = self.model.assoc_table {
            let owner = self.owner()?;
            let filter = Row::new()
                .with(self.model.local_key, owner.value_or_null(self.model.local_key))
                .with(self.model.remote_key, id);
            db.update_associations(table, &filter, &properties)?;
        }

        Ok(true)
    }

    /// Drop all cached members and return to the unloaded state.
    pub(crate) fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.entries.clear();
        state.loaded = false;
    }

    fn ensure_loaded(&self, db: &Db) -> Result<(), Error> {
        if !self.is_loaded() {
            self.load(db)?;
        }
        Ok(())
    }

    // Full (re)load from the backing rows. Clears the cache, fetches the
    // membership rows, and resolves each remote through the registry.
    fn load(&self, db: &Db) -> Result<(), Error> {
        let owner = self.owner()?;
        let local = owner.value_or_null(self.model.local_key);

        let (rows, use_key) = if let Some(table) = self.model.assoc_table {
            let filter = Row::new().with(self.model.local_key, local);
            (db.fetch_associations(table, &filter)?, self.model.remote_key)
        } else {
            let remote_model = db.schemas().try_get(self.model.remote_type)?;
            let filter = Row::new().with(self.model.remote_key, local);
            (
                db.fetch_associations(remote_model.table, &filter)?,
                remote_model.key,
            )
        };

        let mut entries = IndexMap::with_capacity(rows.len());
        for mut row in rows {
            let Some(id) = row.get(use_key).cloned() else {
                // Membership row without its keying column: nothing to
                // resolve an entity by. Skip rather than fail the load.
                continue;
            };
            row.shift_remove(self.model.remote_key);

            // A dangling membership row (remote row deleted out from under
            // the association) is skipped the same way.
            let Some(entity) = db.get(self.model.remote_type, &id)? else {
                continue;
            };
            entries.insert(
                id,
                AssocEntry {
                    properties: row,
                    entity,
                },
            );
        }

        let mut state = self.state.borrow_mut();
        state.entries = entries;
        state.loaded = true;
        Ok(())
    }

    // Membership key for a remote entity: many-to-many keys by the remote's
    // value in the declared remote-key column, one-to-many by the remote's
    // own primary key.
    fn member_key(&self, remote: &Entity) -> Value {
        if self.model.is_one_to_many() {
            remote.key_value()
        } else {
            remote.value_or_null(self.model.remote_key)
        }
    }

    fn member_key_field(&self, db: &Db) -> Result<&'static str, Error> {
        if self.model.is_one_to_many() {
            Ok(db.schemas().try_get(self.model.remote_type)?.key)
        } else {
            Ok(self.model.remote_key)
        }
    }

    // One-to-many: does the cached member's foreign key still point at the
    // owner's local key value?
    fn is_stale(&self, id: &Value) -> Result<bool, Error> {
        let owner = self.owner()?;
        let state = self.state.borrow();
        let Some(entry) = state.entries.get(id) else {
            return Ok(false);
        };

        let remote_link = entry.entity.value_or_null(self.model.remote_key);
        Ok(remote_link != owner.value_or_null(self.model.local_key))
    }

    fn check_remote(&self, remote: &Entity) -> Result<(), Error> {
        if remote.type_name() == self.model.remote_type {
            Ok(())
        } else {
            Err(RelationError::RemoteTypeMismatch {
                relation: self.model.name,
                expected: self.model.remote_type,
                found: remote.type_name(),
            }
            .into())
        }
    }

    fn reject_reserved(&self, properties: &Row) -> Result<(), Error> {
        if properties.contains_key(ENTITY_SLOT) {
            return Err(RelationError::ReservedProperty {
                relation: self.model.name,
            }
            .into());
        }
        Ok(())
    }

    fn owner(&self) -> Result<EntityHandle, Error> {
        self.owner
            .upgrade()
            .ok_or_else(|| RelationError::OwnerReleased {
                relation: self.model.name,
            }
            .into())
    }
}
