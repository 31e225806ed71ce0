//! Runtime data model definitions.
//!
//! Types in `model` are the *declarative* per-type descriptors consumed by
//! entity construction and the registry: which table a type binds to, which
//! field carries its identity, and which relations hang off it. They carry
//! no state and are expected to live in `static` items registered once at
//! process start.

pub mod entity;
pub mod field;
pub mod relation;

pub use entity::EntityModel;
pub use field::{FieldKind, FieldModel};
pub use relation::{MultiModel, SingleModel};
