//! Rowbind: an identity-mapped entity layer over pluggable row storage.
//!
//! A `Db` owns a `StorageAdapter` and guarantees one live [`db::Entity`]
//! per (type name, key value). Field writes persist synchronously, one
//! field at a time; relations resolve lazily through [`db::RelationRef`]
//! and [`db::RelationCollection`] proxies declared in a
//! [`schema::SchemaRegistry`]. Entities are `Rc`-shared and the whole
//! engine is single-actor: nothing here is `Send` or `Sync`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod adapter;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod schema;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No adapters, errors, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        adapter::Row,
        db::{AssocEntry, Db, Entity, EntityHandle, RelationCollection, RelationRef},
        model::{EntityModel, FieldKind, FieldModel, MultiModel, SingleModel},
        schema::SchemaRegistry,
        value::Value,
    };
}
