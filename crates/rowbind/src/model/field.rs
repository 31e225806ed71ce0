///
/// FieldModel
/// Declarative metadata for one scalar column of an entity type.
///

#[derive(Clone, Copy, Debug)]
pub struct FieldModel {
    /// Column name as used in rows, filters, and field writes.
    pub name: &'static str,
    /// Declared scalar shape (documentation-level; values are not coerced).
    pub kind: FieldKind,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

///
/// FieldKind
///
/// Mirrors the `Value` variants. The engine performs no coercion or
/// validation against the declared kind; adapters may use it when mapping
/// to backend column types.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Float,
    Text,
}
