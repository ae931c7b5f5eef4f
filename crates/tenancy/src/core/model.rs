//! Model definitions and association reflection.
//!
//! A [`ModelDefinition`] describes one entity type to the data layer: its
//! table, columns and `belongs_to` associations. The scoping layer only ever
//! reads associations back through [`ModelReflection`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::tenant::dimension::underscore;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit integer
    Integer,
    /// Floating point
    Real,
    /// UTF-8 text
    Text,
    /// Boolean, stored as 0/1
    Boolean,
    /// Arbitrary JSON, stored as text
    Json,
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub column_type: ColumnType,
    /// Whether the column may be left unset.
    pub nullable: bool,
}

/// A declared `belongs_to` association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDefinition {
    /// Association name (e.g., "company").
    pub name: String,
    /// Entity type on the other side (e.g., "Company").
    pub target_type: String,
    /// Foreign-key column on this side (e.g., "company_id").
    pub foreign_key: String,
}

/// What the data layer reports about an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationReflection {
    /// The entity type declaring the association.
    pub entity_type: String,
    /// Association name.
    pub name: String,
    /// Entity type the association points at.
    pub target_type: String,
    /// Foreign-key column holding the target's identity.
    pub foreign_key: String,
}

/// Definition of one entity type.
///
/// # Examples
///
/// ```
/// use helios_tenancy::core::{ColumnType, ModelDefinition};
///
/// let book = ModelDefinition::new("Book")
///     .column("name", ColumnType::Text)
///     .belongs_to("company", "Company")
///     .belongs_to("bookkeeper", "Bookkeeper");
///
/// assert_eq!(book.table(), "books");
/// assert_eq!(book.association("company").unwrap().foreign_key, "company_id");
/// assert!(book.has_column("bookkeeper_id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    name: String,
    table: String,
    columns: Vec<ColumnDefinition>,
    associations: Vec<AssociationDefinition>,
}

impl ModelDefinition {
    /// Creates a model whose table name is the pluralized snake case of
    /// `name` (`Company` -> `companies`).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = pluralize(&underscore(&name).replace('/', "_"));
        Self {
            name,
            table,
            columns: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Overrides the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Adds a nullable column.
    pub fn column(self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.push_column(name.into(), column_type, true)
    }

    /// Adds a column that must be set on every write.
    pub fn required_column(self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.push_column(name.into(), column_type, false)
    }

    /// Declares `belongs_to association`, with foreign key `<association>_id`.
    pub fn belongs_to(self, association: impl Into<String>, target_type: impl Into<String>) -> Self {
        let association = association.into();
        let foreign_key = format!("{}_id", association);
        self.belongs_to_with_key(association, target_type, foreign_key)
    }

    /// Declares `belongs_to association` with an explicit foreign key.
    pub fn belongs_to_with_key(
        mut self,
        association: impl Into<String>,
        target_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let foreign_key = foreign_key.into();
        if !self.has_column(&foreign_key) {
            self = self.push_column(foreign_key.clone(), ColumnType::Integer, true);
        }
        self.associations.push(AssociationDefinition {
            name: association.into(),
            target_type: target_type.into(),
            foreign_key,
        });
        self
    }

    fn push_column(mut self, name: String, column_type: ColumnType, nullable: bool) -> Self {
        self.columns.push(ColumnDefinition {
            name,
            column_type,
            nullable,
        });
        self
    }

    /// Returns the entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the declared columns (excluding the primary key).
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the declared column named `name`.
    pub fn column_named(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if `name` is a declared column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_named(name).is_some()
    }

    /// Returns the declared associations.
    pub fn associations(&self) -> &[AssociationDefinition] {
        &self.associations
    }

    /// Returns the association named `name`.
    pub fn association(&self, name: &str) -> Option<&AssociationDefinition> {
        self.associations.iter().find(|a| a.name == name)
    }
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", stem);
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Read access to association metadata.
pub trait ModelReflection {
    /// Looks up association `name` on `entity_type`.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::UnknownModel` - if the entity type is not defined
    /// * `ConfigurationError::AssociationNotFound` - if the association is not declared
    fn reflect_association(&self, entity_type: &str, name: &str) -> ConfigResult<AssociationReflection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(ModelDefinition::new("Company").table(), "companies");
        assert_eq!(ModelDefinition::new("User").table(), "users");
        assert_eq!(ModelDefinition::new("Bookkeeper").table(), "bookkeepers");
        assert_eq!(ModelDefinition::new("Key").table(), "keys");
        assert_eq!(ModelDefinition::new("Address").table(), "addresses");
        assert_eq!(ModelDefinition::new("CostCenter").table(), "cost_centers");
    }

    #[test]
    fn test_belongs_to_adds_foreign_key_column() {
        let user = ModelDefinition::new("User").belongs_to("company", "Company");
        let column = user.column_named("company_id").unwrap();
        assert_eq!(column.column_type, ColumnType::Integer);
        assert!(column.nullable);
    }

    #[test]
    fn test_belongs_to_with_existing_column() {
        let item = ModelDefinition::new("Item")
            .column("owner", ColumnType::Integer)
            .belongs_to_with_key("tenant", "Tenant", "owner");
        assert_eq!(item.columns().len(), 1);
        assert_eq!(item.association("tenant").unwrap().foreign_key, "owner");
    }

    #[test]
    fn test_missing_association() {
        let user = ModelDefinition::new("User");
        assert!(user.association("company").is_none());
    }
}
