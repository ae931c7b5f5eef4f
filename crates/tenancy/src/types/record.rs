//! Record type.
//!
//! This module defines [`Record`], a row of a modelled entity type with its
//! attributes held as JSON values plus persistence metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tenant::TenantId;

/// A row of an entity type.
///
/// A record is *new* until the data layer assigns it a primary key on
/// create. Attributes map column names to JSON values; a column that is
/// absent or `null` counts as unset.
///
/// # Examples
///
/// ```
/// use helios_tenancy::types::Record;
/// use serde_json::json;
///
/// let user = Record::new("User").with("name", "alice").with("company_id", 3);
///
/// assert!(user.is_new_record());
/// assert!(user.is_set("company_id"));
/// assert!(!user.is_set("email"));
/// assert_eq!(user.get("name"), Some(&json!("alice")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The entity type (e.g., "User").
    entity_type: String,

    /// The primary key, once persisted.
    id: Option<i64>,

    /// Column values.
    attributes: Map<String, Value>,

    /// When the record was inserted.
    created_at: Option<DateTime<Utc>>,

    /// When the record was last written.
    updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a new, unsaved record with no attributes.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            attributes: Map::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Creates a record as loaded from storage.
    pub(crate) fn from_storage(
        entity_type: impl Into<String>,
        id: i64,
        attributes: Map<String, Value>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: Some(id),
            attributes,
            created_at,
            updated_at,
        }
    }

    /// Returns the record with `attribute` set to `value`.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Sets `attribute` to `value`.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Removes `attribute`, returning its previous value.
    pub fn unset(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    /// Returns the value of `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Returns the value of `attribute` as an integer.
    pub fn get_i64(&self, attribute: &str) -> Option<i64> {
        self.get(attribute).and_then(Value::as_i64)
    }

    /// Returns the value of `attribute` as a string slice.
    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    /// Returns `true` if `attribute` is present and not `null`.
    pub fn is_set(&self, attribute: &str) -> bool {
        self.get(attribute).is_some_and(|v| !v.is_null())
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the primary key, if persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Returns `true` if the record has not been inserted yet.
    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// Returns this record's identity as a tenant, if persisted.
    ///
    /// Used when this record owns a dimension, e.g. a company passed to
    /// `with_tenant`.
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.id.map(TenantId::new)
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the creation timestamp, if persisted.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the last-write timestamp, if persisted.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
