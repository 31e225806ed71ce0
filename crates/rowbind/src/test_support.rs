//! Module: test_support
//! Responsibility: shared fixtures for crate tests: an event-scheduling
//! schema exercising every relation shape, plus a harness wiring a `Db`
//! to a `MemoryAdapter` whose state the test keeps a handle on.

use crate::{
    adapter::{MemoryAdapter, Row},
    db::Db,
    model::{EntityModel, FieldKind, FieldModel, MultiModel, SingleModel},
    schema::SchemaRegistry,
    value::Value,
};

// Primary keys follow the backing-table naming convention (event_id, not
// id), so one-to-many foreign keys and association-table columns share
// their column names with the owner's key field.

pub static EVENT: EntityModel = EntityModel {
    type_name: "Event",
    table: "events",
    key: "event_id",
    fields: &[
        FieldModel::new("event_id", FieldKind::Uint),
        FieldModel::new("title", FieldKind::Text),
        FieldModel::new("venue_id", FieldKind::Uint),
    ],
    singles: &[SingleModel {
        name: "venue",
        local_key: "venue_id",
        remote_type: "Venue",
        remote_key: "venue_id",
        local_link: true,
    }],
    multis: &[
        MultiModel {
            name: "occurrences",
            local_key: "event_id",
            remote_type: "Occurrence",
            remote_key: "o_event_id",
            assoc_table: None,
        },
        MultiModel {
            name: "categories",
            local_key: "event_id",
            remote_type: "Category",
            remote_key: "category_id",
            assoc_table: Some("category_assign"),
        },
    ],
};

pub static OCCURRENCE: EntityModel = EntityModel {
    type_name: "Occurrence",
    table: "occurrences",
    key: "occurrence_id",
    fields: &[
        FieldModel::new("occurrence_id", FieldKind::Uint),
        FieldModel::new("o_event_id", FieldKind::Uint),
        FieldModel::new("starts_at", FieldKind::Int),
    ],
    singles: &[SingleModel {
        name: "event",
        local_key: "o_event_id",
        remote_type: "Event",
        remote_key: "event_id",
        local_link: true,
    }],
    multis: &[],
};

pub static VENUE: EntityModel = EntityModel {
    type_name: "Venue",
    table: "venues",
    key: "venue_id",
    fields: &[
        FieldModel::new("venue_id", FieldKind::Uint),
        FieldModel::new("name", FieldKind::Text),
    ],
    // Shared-primary-key one-to-one: the detail row's key is the venue's
    // key, so the linkage lives on the remote side.
    singles: &[SingleModel {
        name: "detail",
        local_key: "venue_id",
        remote_type: "VenueDetail",
        remote_key: "venue_id",
        local_link: false,
    }],
    multis: &[],
};

pub static VENUE_DETAIL: EntityModel = EntityModel {
    type_name: "VenueDetail",
    table: "venue_details",
    key: "venue_id",
    fields: &[
        FieldModel::new("venue_id", FieldKind::Uint),
        FieldModel::new("capacity", FieldKind::Int),
    ],
    singles: &[],
    multis: &[],
};

pub static CATEGORY: EntityModel = EntityModel {
    type_name: "Category",
    table: "categories",
    key: "category_id",
    fields: &[
        FieldModel::new("category_id", FieldKind::Uint),
        FieldModel::new("label", FieldKind::Text),
    ],
    singles: &[],
    multis: &[],
};

pub fn registry() -> SchemaRegistry {
    let mut schemas = SchemaRegistry::new();
    for model in [&EVENT, &OCCURRENCE, &VENUE, &VENUE_DETAIL, &CATEGORY] {
        schemas
            .register(model)
            .expect("fixture schema should register cleanly");
    }
    schemas
}

/// A `Db` over a fresh `MemoryAdapter`, plus a second handle on the same
/// adapter state for seeding and journal inspection.
pub fn harness() -> (Db, MemoryAdapter) {
    let adapter = MemoryAdapter::new();
    let db = Db::new(registry(), adapter.clone());
    (db, adapter)
}

pub fn seed_event(adapter: &MemoryAdapter, event_id: u64, title: &str) {
    adapter.seed(
        "events",
        Row::new()
            .with("event_id", event_id)
            .with("title", title)
            .with("venue_id", Value::Null),
    );
}

pub fn seed_occurrence(adapter: &MemoryAdapter, occurrence_id: u64, event_id: Value, starts_at: i64) {
    adapter.seed(
        "occurrences",
        Row::new()
            .with("occurrence_id", occurrence_id)
            .with("o_event_id", event_id)
            .with("starts_at", starts_at),
    );
}

pub fn seed_category(adapter: &MemoryAdapter, category_id: u64, label: &str) {
    adapter.seed(
        "categories",
        Row::new().with("category_id", category_id).with("label", label),
    );
}
