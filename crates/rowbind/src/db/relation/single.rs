//! Module: relation::single
//! Responsibility: the to-one relationship proxy.
//!
//! Invariants:
//! - Resolution happens at most once per proxy; after that the cached
//!   remote is only replaced by an explicit `set` (or `clear` during
//!   teardown).
//! - `set` never persists. Mirroring the link into the owner's local
//!   foreign-key field is the owning entity's field-write path
//!   (`Db::set_related`).

use crate::{
    db::{Db, entity::{Entity, EntityHandle}, relation::RelationError},
    error::Error,
    model::SingleModel,
    value::Value,
};
use std::{cell::RefCell, rc::Weak};

///
/// RelationRef
///

pub struct RelationRef {
    owner: Weak<Entity>,
    model: &'static SingleModel,
    state: RefCell<SingleState>,
}

#[derive(Default)]
struct SingleState {
    remote: Option<EntityHandle>,
    resolved: bool,
}

impl RelationRef {
    pub(crate) fn new(
        owner: Weak<Entity>,
        model: &'static SingleModel,
    ) -> Self {
        Self {
            owner,
            model,
            state: RefCell::new(SingleState::default()),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &'static SingleModel {
        self.model
    }

    #[must_use]
    /// Return the cached remote entity. Never triggers a fetch; use
    /// [`Self::resolve`] for first access.
    pub fn get(&self) -> Option<EntityHandle> {
        self.state.borrow().remote.clone()
    }

    #[must_use]
    /// True once `set` has been called at least once, including with `None`.
    pub fn is_init(&self) -> bool {
        self.state.borrow().resolved
    }

    /// Store the remote reference (or its absence) and mark the proxy
    /// resolved. Never persists.
    pub fn set(&self, remote: Option<EntityHandle>) {
        let mut state = self.state.borrow_mut();
        state.remote = remote;
        state.resolved = true;
    }

    /// Reset to the unresolved state. Used by teardown and by callers that
    /// want to force a re-fetch on next resolve.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.remote = None;
        state.resolved = false;
    }

    /// First-access resolution: read the owner's local key, look the remote
    /// up through the registry, and cache the outcome. For a locally linked
    /// relation, a non-null local key that resolves to nothing is treated
    /// as stale and cleared on the owner (persisted), so it is not chased
    /// again.
    pub fn resolve(&self, db: &Db) -> Result<Option<EntityHandle>, Error> {
        if !self.is_init() {
            let owner = self.owner()?;
            let local = owner.value(self.model.local_key).unwrap_or(Value::Null);

            let remote = if local.is_null() {
                None
            } else {
                db.get(self.model.remote_type, &local)?
            };

            self.set(remote.clone());
            // Only a locally stored link has a clearable field on the
            // owner; a remote-side linkage reads through the owner's own
            // key, which is immutable.
            if remote.is_none() && !local.is_null() && self.model.local_link {
                db.set_field(&owner, self.model.local_key, Value::Null)?;
            }
        }

        Ok(self.get())
    }

    /// The remote's value in the linking field, or null when unset.
    #[must_use]
    pub fn link_value(&self) -> Value {
        self.state
            .borrow()
            .remote
            .as_ref()
            .and_then(|remote| remote.value(self.model.remote_key))
            .unwrap_or(Value::Null)
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
