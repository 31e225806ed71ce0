///
/// SingleModel
/// Declaration of a to-one relation from an owning type to a remote type.
///

#[derive(Clone, Copy, Debug)]
pub struct SingleModel {
    /// Relation name; the slot the owner exposes the remote entity under.
    pub name: &'static str,
    /// Field on the owner holding the linking value.
    pub local_key: &'static str,
    /// Registered type name of the remote entity.
    pub remote_type: &'static str,
    /// Field on the remote entity that `local_key` points at.
    pub remote_key: &'static str,
    /// Whether the linkage is stored on the owning side. When true, setting
    /// the relation also writes and persists `local_key`.
    pub local_link: bool,
}

///
/// MultiModel
/// Declaration of a to-many relation: one-to-many when no association
/// table is named, many-to-many otherwise.
///

#[derive(Clone, Copy, Debug)]
pub struct MultiModel {
    /// Relation name; the slot the owner exposes the collection under.
    pub name: &'static str,
    /// Field on the owner whose value anchors the membership filter.
    pub local_key: &'static str,
    /// Registered type name of the remote entity.
    pub remote_type: &'static str,
    /// One-to-many: the foreign-key column on the remote table.
    /// Many-to-many: the remote-key column of the association table.
    pub remote_key: &'static str,
    /// Association table holding (local key, remote key, properties) rows.
    /// `None` declares a one-to-many relation.
    pub assoc_table: Option<&'static str>,
}

impl MultiModel {
    #[must_use]
    /// Return whether this relation links through the remote table's own
    /// foreign key rather than an association table.
    pub const fn is_one_to_many(&self) -> bool {
        self.assoc_table.is_none()
    }
}
