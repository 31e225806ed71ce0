use crate::model::{
    field::FieldModel,
    relation::{MultiModel, SingleModel},
};

///
/// EntityModel
///
/// Static runtime descriptor for one entity type: the table it binds to,
/// the field carrying its identity, and its declared fields and relations.
/// One `&'static EntityModel` per concrete type, registered in the
/// `SchemaRegistry` before use.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Stable external name used as the identity-map type key.
    pub type_name: &'static str,
    /// Backing table name.
    pub table: &'static str,
    /// Key field; immutable after row creation.
    pub key: &'static str,
    /// Declared scalar fields (authoritative; undeclared row columns are
    /// dropped at construction).
    pub fields: &'static [FieldModel],
    /// To-one relation declarations.
    pub singles: &'static [SingleModel],
    /// To-many relation declarations.
    pub multis: &'static [MultiModel],
}

impl EntityModel {
    #[must_use]
    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    /// Look up a declared to-one relation by name.
    pub fn single(&self, name: &str) -> Option<&'static SingleModel> {
        self.singles.iter().find(|s| s.name == name)
    }

    #[must_use]
    /// Look up a declared to-many relation by name.
    pub fn multi(&self, name: &str) -> Option<&'static MultiModel> {
        self.multis.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn is_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    #[must_use]
    pub fn is_relation(&self, name: &str) -> bool {
        self.single(name).is_some() || self.multi(name).is_some()
    }
}
