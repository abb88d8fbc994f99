//! Relation specifications used to render join conditions.

use super::{DatabaseType, quote_identifier};

/// Type of relation between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relation (e.g., User has one Profile).
    OneToOne,
    /// One-to-many relation (e.g., User has many Posts).
    OneToMany,
    /// Many-to-one relation (e.g., Post belongs to User).
    ManyToOne,
}

impl RelationType {
    /// Check if this relation returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::OneToMany)
    }
}

/// How a relation joins its owner to the related table.
///
/// Without a registered spec, [`crate::sql::SqlCriteria`] assumes a
/// many-to-one relation to a table named like the relation, keyed by
/// `<relation>_id` on the owner and `id` on the related table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    /// Name of the relation (field name).
    pub name: String,
    /// Type of relation.
    pub relation_type: RelationType,
    /// Name of the related table.
    pub related_table: String,
    /// Key columns on the owning side.
    pub fields: Vec<String>,
    /// Referenced columns on the related side.
    pub references: Vec<String>,
}

impl RelationSpec {
    fn new(name: impl Into<String>, relation_type: RelationType, related_table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation_type,
            related_table: related_table.into(),
            fields: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Create a one-to-one relation spec.
    pub fn one_to_one(name: impl Into<String>, related_table: impl Into<String>) -> Self {
        Self::new(name, RelationType::OneToOne, related_table)
    }

    /// Create a one-to-many relation spec.
    pub fn one_to_many(name: impl Into<String>, related_table: impl Into<String>) -> Self {
        Self::new(name, RelationType::OneToMany, related_table)
    }

    /// Create a many-to-one relation spec.
    pub fn many_to_one(name: impl Into<String>, related_table: impl Into<String>) -> Self {
        Self::new(name, RelationType::ManyToOne, related_table)
    }

    /// Join assumed for a relation nobody registered.
    pub fn conventional(name: &str) -> Self {
        Self::many_to_one(name, name)
            .fields([format!("{}_id", name)])
            .references(["id"])
    }

    /// Set the owning-side key columns.
    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the referenced columns.
    pub fn references(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.references = refs.into_iter().map(Into::into).collect();
        self
    }

    /// Generate the `ON` condition between the owner alias and the joined alias.
    pub fn on_condition(&self, parent_alias: &str, child_alias: &str, db: DatabaseType) -> String {
        let conditions: Vec<_> = self
            .fields
            .iter()
            .zip(self.references.iter())
            .map(|(f, r)| {
                format!(
                    "{}.{} = {}.{}",
                    parent_alias,
                    quote_identifier(f, db),
                    child_alias,
                    quote_identifier(r, db)
                )
            })
            .collect();

        if conditions.is_empty() {
            "TRUE".to_string()
        } else {
            conditions.join(" AND ")
        }
    }
}
