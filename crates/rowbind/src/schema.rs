//! Module: schema
//! Responsibility: the type-name → descriptor registry.
//! Does not own: entity state, persistence, or relation resolution.
//!
//! Invariants:
//! - One descriptor per type name; duplicates are rejected at registration.
//! - Registered descriptors are structurally sound: the key field is
//!   declared, relation names collide with nothing, and no locally-linked
//!   single relation rides on the primary key (teardown and stale-link
//!   clearing would have to rewrite identity).

use crate::{error::ErrorClass, model::EntityModel};
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("entity type '{0}' not registered")]
    TypeNotFound(String),

    #[error("entity type '{0}' already registered")]
    TypeAlreadyRegistered(&'static str),

    #[error("entity type '{type_name}' does not declare its key field '{key}'")]
    KeyFieldUndeclared {
        type_name: &'static str,
        key: &'static str,
    },

    #[error("relation '{name}' of '{type_name}' collides with another declared name")]
    RelationNameCollision {
        type_name: &'static str,
        name: &'static str,
    },

    #[error(
        "single relation '{name}' of '{type_name}' stores its link in the key field '{key}'"
    )]
    LinkedKeyIsPrimary {
        type_name: &'static str,
        name: &'static str,
        key: &'static str,
    },
}

impl SchemaError {
    pub(crate) const fn class(&self) -> ErrorClass {
        ErrorClass::Schema
    }
}

///
/// SchemaRegistry
///
/// Explicit replacement for per-type "static info" lookups: every concrete
/// entity type registers its descriptor here once, and the registry hands
/// it to entity construction and row routing by type name.
///

#[derive(Default)]
pub struct SchemaRegistry {
    types: HashMap<&'static str, &'static EntityModel>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate registered descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &'static EntityModel> + '_ {
        self.types.values().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validate and register one entity descriptor.
    pub fn register(&mut self, model: &'static EntityModel) -> Result<(), SchemaError> {
        if self.types.contains_key(model.type_name) {
            return Err(SchemaError::TypeAlreadyRegistered(model.type_name));
        }
        Self::validate(model)?;

        self.types.insert(model.type_name, model);
        Ok(())
    }

    /// Look up a descriptor by type name.
    pub fn try_get(&self, type_name: &str) -> Result<&'static EntityModel, SchemaError> {
        self.types
            .get(type_name)
            .copied()
            .ok_or_else(|| SchemaError::TypeNotFound(type_name.to_string()))
    }

    // Structural checks that hold for every descriptor this registry hands out.
    fn validate(model: &'static EntityModel) -> Result<(), SchemaError> {
        if !model.is_field(model.key) {
            return Err(SchemaError::KeyFieldUndeclared {
                type_name: model.type_name,
                key: model.key,
            });
        }

        let mut seen: Vec<&'static str> = Vec::new();
        let relation_names = model
            .singles
            .iter()
            .map(|s| s.name)
            .chain(model.multis.iter().map(|m| m.name));
        for name in relation_names {
            if model.is_field(name) || seen.contains(&name) {
                return Err(SchemaError::RelationNameCollision {
                    type_name: model.type_name,
                    name,
                });
            }
            seen.push(name);
        }

        for single in model.singles {
            if single.local_link && single.local_key == model.key {
                return Err(SchemaError::LinkedKeyIsPrimary {
                    type_name: model.type_name,
                    name: single.name,
                    key: model.key,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, FieldModel, SingleModel};

    static PLAIN: EntityModel = EntityModel {
        type_name: "schema_tests_plain",
        table: "plain",
        key: "id",
        fields: &[FieldModel::new("id", FieldKind::Uint)],
        singles: &[],
        multis: &[],
    };

    static KEYLESS: EntityModel = EntityModel {
        type_name: "schema_tests_keyless",
        table: "keyless",
        key: "id",
        fields: &[FieldModel::new("name", FieldKind::Text)],
        singles: &[],
        multis: &[],
    };

    static SHADOWED: EntityModel = EntityModel {
        type_name: "schema_tests_shadowed",
        table: "shadowed",
        key: "id",
        fields: &[
            FieldModel::new("id", FieldKind::Uint),
            FieldModel::new("owner", FieldKind::Uint),
        ],
        singles: &[SingleModel {
            name: "owner",
            local_key: "owner",
            remote_type: "schema_tests_plain",
            remote_key: "id",
            local_link: true,
        }],
        multis: &[],
    };

    static LINKED_ON_KEY: EntityModel = EntityModel {
        type_name: "schema_tests_linked_on_key",
        table: "linked_on_key",
        key: "id",
        fields: &[FieldModel::new("id", FieldKind::Uint)],
        singles: &[SingleModel {
            name: "parent",
            local_key: "id",
            remote_type: "schema_tests_plain",
            remote_key: "id",
            local_link: true,
        }],
        multis: &[],
    };

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(&PLAIN).expect("first registration");

        let err = registry
            .register(&PLAIN)
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, SchemaError::TypeAlreadyRegistered(_)));
    }

    #[test]
    fn undeclared_key_field_is_rejected() {
        let err = SchemaRegistry::new()
            .register(&KEYLESS)
            .expect_err("keyless model should fail validation");
        assert!(matches!(err, SchemaError::KeyFieldUndeclared { .. }));
    }

    #[test]
    fn relation_name_shadowing_a_field_is_rejected() {
        let err = SchemaRegistry::new()
            .register(&SHADOWED)
            .expect_err("relation name shadowing a field should fail");
        assert!(matches!(err, SchemaError::RelationNameCollision { .. }));
    }

    #[test]
    fn locally_linked_relation_on_primary_key_is_rejected() {
        let err = SchemaRegistry::new()
            .register(&LINKED_ON_KEY)
            .expect_err("link stored in the key field should fail");
        assert!(matches!(err, SchemaError::LinkedKeyIsPrimary { .. }));
    }

    #[test]
    fn unknown_type_lookup_fails_softly_typed() {
        let registry = SchemaRegistry::new();
        let err = registry.try_get("nope").expect_err("unknown type");
        assert!(matches!(err, SchemaError::TypeNotFound(_)));
    }
}
