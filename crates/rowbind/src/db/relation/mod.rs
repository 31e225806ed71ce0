//! Module: relation
//! Responsibility: lazy relationship proxies hanging off an entity.
//! Does not own: the owning entity's lifetime (proxies hold weak
//! back-references) or persistence routing (all writes go through `Db`).

pub mod collection;
pub mod single;

pub use collection::{AssocEntry, ENTITY_SLOT, RelationCollection};
pub use single::RelationRef;

use crate::error::ErrorClass;
use thiserror::Error as ThisError;

///
/// RelationError
///

#[derive(Debug, ThisError)]
pub enum RelationError {
    #[error("relation '{relation}': association property '{ENTITY_SLOT}' is reserved")]
    ReservedProperty { relation: &'static str },

    #[error("relation '{relation}': remote entity has no value in its key field '{field}'")]
    MissingKey {
        relation: &'static str,
        field: &'static str,
    },

    #[error("relation '{relation}' links entities of type '{expected}', got '{found}'")]
    RemoteTypeMismatch {
        relation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("relation '{relation}': owning entity has been released")]
    OwnerReleased { relation: &'static str },
}

impl RelationError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::ReservedProperty { .. } => ErrorClass::InvalidProperty,
            Self::MissingKey { .. } => ErrorClass::MissingKey,
            Self::RemoteTypeMismatch { .. } => ErrorClass::InvalidArgument,
            Self::OwnerReleased { .. } => ErrorClass::Internal,
        }
    }
}

///
/// Relation
/// The two proxy kinds an entity can expose under a relation name.
///

pub enum Relation {
    Single(RelationRef),
    Multi(RelationCollection),
}
