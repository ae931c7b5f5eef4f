//! Registration of tenant-scoped entity types.
//!
//! The [`DimensionRegistry`] binds each tenant-owning entity type (a company,
//! a bookkeeper, ...) to the [`Dimension`] its current tenant is stored under.
//! It is populated once at startup and only read afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::TenantContext;
use super::dimension::Dimension;
use super::id::TenantId;
use crate::config::NestedScope;
use crate::error::{ConfigResult, ConfigurationError};

/// Options accepted by [`DimensionRegistry::register`].
///
/// The option set is closed: `dimension_key` is the only recognised key.
///
/// # Examples
///
/// ```
/// use helios_tenancy::tenant::ScopedOptions;
/// use serde_json::json;
///
/// let options = ScopedOptions::from_value(&json!({"dimension_key": "org"})).unwrap();
/// assert_eq!(options.dimension_key.as_deref(), Some("org"));
///
/// assert!(ScopedOptions::from_value(&json!({"thread_local": "org"})).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopedOptions {
    /// Explicit context key. Defaults to the lower-snake-cased type name.
    #[serde(default)]
    pub dimension_key: Option<String>,
}

impl ScopedOptions {
    /// The recognised option keys.
    pub const KEYS: &'static [&'static str] = &["dimension_key"];

    /// Creates options with every key unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit dimension key.
    pub fn with_dimension_key(mut self, key: impl Into<String>) -> Self {
        self.dimension_key = Some(key.into());
        self
    }

    /// Parses options from an untyped map, naming the first unknown key.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ConfigurationError::InvalidOptions {
                found: value.to_string(),
            })?;

        let mut options = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "dimension_key" => {
                    options.dimension_key = match value {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => {
                            return Err(ConfigurationError::InvalidDimensionKey {
                                key: other.to_string(),
                                reason: "dimension_key must be a string".to_string(),
                            });
                        }
                    };
                }
                _ => {
                    return Err(ConfigurationError::UnknownOption {
                        key: key.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(options)
    }

    /// Resolves the dimension these options select for `entity_type`.
    pub fn resolve(&self, entity_type: &str) -> ConfigResult<Dimension> {
        match &self.dimension_key {
            Some(key) => Dimension::parse(key),
            None => Ok(Dimension::derive(entity_type)),
        }
    }
}

/// A registered tenant-scoped entity type and its dimension.
///
/// This is the handle application code keeps after registration to read and
/// write the type's current tenant. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedType {
    entity_type: Arc<str>,
    dimension: Dimension,
    nested_scope: NestedScope,
}

impl ScopedType {
    pub(crate) fn new(entity_type: &str, dimension: Dimension, nested_scope: NestedScope) -> Self {
        Self {
            entity_type: Arc::from(entity_type),
            dimension,
            nested_scope,
        }
    }

    /// Returns the entity type name.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the dimension this type owns.
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    /// Returns what `with_tenant` leaves in the slot on exit.
    pub fn nested_scope(&self) -> NestedScope {
        self.nested_scope
    }

    /// Returns the tenant currently set for this type's dimension.
    pub fn current_tenant(&self) -> Option<TenantId> {
        TenantContext::get(&self.dimension)
    }

    /// Sets (or with `None`, clears) the tenant for this type's dimension in
    /// the calling execution context.
    ///
    /// From async code this must run inside a task scope; see
    /// [`TenantContext::set`].
    pub fn set_current_tenant(&self, tenant: Option<TenantId>) -> ConfigResult<()> {
        TenantContext::set(&self.dimension, tenant)
    }
}

/// Process-wide table of tenant-scoped entity types.
#[derive(Debug, Default)]
pub struct DimensionRegistry {
    entries: RwLock<HashMap<String, ScopedType>>,
    nested_scope: NestedScope,
}

impl DimensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose types use the given `with_tenant`
    /// exit behavior.
    pub fn with_nested_scope(nested_scope: NestedScope) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            nested_scope,
        }
    }

    /// Marks `entity_type` as tenant-scoped.
    ///
    /// Registering the same type twice with options that resolve to the same
    /// dimension is a no-op. A second registration that resolves to a
    /// different dimension fails with
    /// [`ConfigurationError::ConflictingDimension`].
    pub fn register(&self, entity_type: &str, options: &ScopedOptions) -> ConfigResult<ScopedType> {
        let requested = options.resolve(entity_type)?;
        let mut entries = self.entries.write();

        if let Some(existing) = entries.get(entity_type) {
            if existing.dimension == requested {
                return Ok(existing.clone());
            }
            return Err(ConfigurationError::ConflictingDimension {
                entity_type: entity_type.to_string(),
                existing: existing.dimension.clone(),
                requested,
            });
        }

        if let Some(other) = entries.values().find(|t| t.dimension == requested) {
            tracing::warn!(
                entity_type,
                other = other.entity_type(),
                dimension = %requested,
                "Dimension shared by multiple tenant-scoped types"
            );
        }

        let scoped = ScopedType::new(entity_type, requested, self.nested_scope);
        tracing::info!(entity_type, dimension = %scoped.dimension, "Registered tenant-scoped type");
        entries.insert(entity_type.to_string(), scoped.clone());
        Ok(scoped)
    }

    /// Returns the registration for `entity_type`.
    pub fn lookup(&self, entity_type: &str) -> ConfigResult<ScopedType> {
        self.entries
            .read()
            .get(entity_type)
            .cloned()
            .ok_or_else(|| ConfigurationError::NotTenantScoped {
                entity_type: entity_type.to_string(),
            })
    }

    /// Returns the dimension owned by `entity_type`.
    pub fn dimension_of(&self, entity_type: &str) -> ConfigResult<Dimension> {
        self.lookup(entity_type).map(|t| t.dimension)
    }

    /// Returns the current tenant of `entity_type`'s dimension.
    pub fn current_tenant(&self, entity_type: &str) -> ConfigResult<Option<TenantId>> {
        self.lookup(entity_type).map(|t| t.current_tenant())
    }

    /// Sets (or with `None`, clears) the current tenant of `entity_type`'s
    /// dimension.
    pub fn set_current_tenant(&self, entity_type: &str, tenant: Option<TenantId>) -> ConfigResult<()> {
        self.lookup(entity_type)?.set_current_tenant(tenant)
    }

    /// Returns `true` if `entity_type` has been registered.
    pub fn is_scoped(&self, entity_type: &str) -> bool {
        self.entries.read().contains_key(entity_type)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all registrations, sorted by entity type.
    pub fn registrations(&self) -> Vec<ScopedType> {
        let mut all: Vec<_> = self.entries.read().values().cloned().collect();
        all.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
        all
    }
}
