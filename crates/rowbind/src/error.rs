//! Module: error
//! Responsibility: the crate-wide error surface and its classification.
//! Does not own: the per-module failure vocabularies; those live next to
//! the code that raises them and convert into [`Error`] here.
//!
//! A missing row is never an error anywhere in this crate: lookups return
//! `Ok(None)`. Everything below signals a violation at the point of the
//! offending call and is never retried by the engine.

use crate::{
    adapter::AdapterError,
    db::{RegistryError, entity::EntityError, relation::RelationError},
    schema::SchemaError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Relation(#[from] RelationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl Error {
    /// Classify this error for taxonomy-level branching.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Schema(err) => err.class(),
            Self::Entity(err) => err.class(),
            Self::Relation(err) => err.class(),
            Self::Registry(err) => err.class(),
            Self::Adapter(_) => ErrorClass::Storage,
        }
    }
}

///
/// ErrorClass
///
/// Stable taxonomy over the per-module error enums. Callers that only care
/// whether a failure was "bad field name" vs "bad argument" branch on this
/// instead of matching every variant.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Write or lookup against an undeclared (or immutable) field name.
    InvalidField,
    /// A relation slot received the wrong kind of operand.
    TypeMismatch,
    /// An association property collided with the reserved entity slot.
    InvalidProperty,
    /// A remote entity's key field was unset when forming an association.
    MissingKey,
    /// A list/association operation received an entity of the wrong type.
    InvalidArgument,
    /// Schema registration or lookup failure.
    Schema,
    /// Failure at the storage-adapter boundary.
    Storage,
    /// Engine invariant violation; indicates a bug or corrupted backing data.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidField => "invalid_field",
            Self::TypeMismatch => "type_mismatch",
            Self::InvalidProperty => "invalid_property",
            Self::MissingKey => "missing_key",
            Self::InvalidArgument => "invalid_argument",
            Self::Schema => "schema",
            Self::Storage => "storage",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}
