//! Tenant scoping of entity types.
//!
//! [`ScopeEnforcer::belongs_to_tenant`] ties an entity type to a tenant-owning
//! type through one of its `belongs_to` associations and installs two things
//! on the data layer, both backed by the same [`TenantScope`]:
//!
//! - a default read filter restricting rows to the current tenant's foreign
//!   key, or imposing nothing when no tenant is set;
//! - a create-only pre-persist hook filling an unset foreign key from the
//!   current tenant.
//!
//! Several declarations on one entity type compose with AND, since the data
//! layer applies every installed filter.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{DataMapper, PersistPhase, PrePersistHook, ReadFilter};
use crate::error::ConfigResult;
use crate::tenant::{DimensionRegistry, ScopedType, TenantId};
use crate::types::{Predicate, Record};

/// One scoped association: `entity_type.foreign_key` holds the identity of
/// the current tenant of `owner`.
///
/// The association is resolved once at declaration; only the tenant is read
/// per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    entity_type: String,
    association: String,
    foreign_key: String,
    owner: ScopedType,
}

impl TenantScope {
    /// Returns the scoped entity type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the association name.
    pub fn association(&self) -> &str {
        &self.association
    }

    /// Returns the foreign-key column.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    /// Returns the tenant-owning type.
    pub fn owner(&self) -> &ScopedType {
        &self.owner
    }

    /// Returns the tenant this scope currently restricts to.
    pub fn current_tenant(&self) -> Option<TenantId> {
        self.owner.current_tenant()
    }
}

impl ReadFilter for TenantScope {
    fn predicate(&self) -> Option<Predicate> {
        let tenant = self.current_tenant()?;
        tracing::trace!(
            entity_type = %self.entity_type,
            foreign_key = %self.foreign_key,
            tenant_id = %tenant,
            "Applying tenant read filter"
        );
        Some(Predicate::eq(self.foreign_key.clone(), tenant))
    }
}

impl PrePersistHook for TenantScope {
    fn before_persist(&self, record: &mut Record) {
        let Some(tenant) = self.current_tenant() else {
            return;
        };

        if record.is_set(&self.foreign_key) {
            if record.get_i64(&self.foreign_key) != Some(tenant.value()) {
                tracing::warn!(
                    entity_type = %self.entity_type,
                    foreign_key = %self.foreign_key,
                    tenant_id = %tenant,
                    "Foreign key already set to another tenant; leaving it"
                );
            }
            return;
        }

        tracing::debug!(
            entity_type = %self.entity_type,
            foreign_key = %self.foreign_key,
            tenant_id = %tenant,
            "Populating foreign key from tenant context"
        );
        record.set(self.foreign_key.clone(), tenant);
    }
}

/// Declares and tracks tenant scopes.
#[derive(Debug, Default)]
pub struct ScopeEnforcer {
    scopes: RwLock<HashMap<String, Vec<Arc<TenantScope>>>>,
}

impl ScopeEnforcer {
    /// Creates an enforcer with no scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes `entity_type` by the tenant-owning type its `association`
    /// points at.
    ///
    /// Declaring the same association twice returns the existing scope and
    /// installs nothing new.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::UnknownModel` - if the data layer does not know `entity_type`
    /// * `ConfigurationError::AssociationNotFound` - if the association is not declared
    /// * `ConfigurationError::NotTenantScoped` - if the target type was never registered
    pub fn belongs_to_tenant<M>(
        &self,
        registry: &DimensionRegistry,
        mapper: &M,
        entity_type: &str,
        association: &str,
    ) -> ConfigResult<Arc<TenantScope>>
    where
        M: DataMapper + ?Sized,
    {
        let reflection = mapper.reflect_association(entity_type, association)?;
        let owner = registry.lookup(&reflection.target_type)?;

        let mut scopes = self.scopes.write();
        let declared = scopes.entry(entity_type.to_string()).or_default();
        if let Some(existing) = declared.iter().find(|s| s.association == association) {
            return Ok(Arc::clone(existing));
        }

        let scope = Arc::new(TenantScope {
            entity_type: entity_type.to_string(),
            association: reflection.name,
            foreign_key: reflection.foreign_key,
            owner,
        });

        mapper.install_default_read_filter(entity_type, Arc::clone(&scope) as Arc<dyn ReadFilter>)?;
        mapper.install_pre_persist_hook(
            entity_type,
            Arc::clone(&scope) as Arc<dyn PrePersistHook>,
            PersistPhase::Create,
        )?;

        tracing::info!(
            entity_type,
            association,
            foreign_key = %scope.foreign_key,
            dimension = %scope.owner.dimension(),
            "Declared tenant scope"
        );
        declared.push(Arc::clone(&scope));
        Ok(scope)
    }

    /// Returns the scopes declared on `entity_type`, in declaration order.
    pub fn scopes_for(&self, entity_type: &str) -> Vec<Arc<TenantScope>> {
        self.scopes
            .read()
            .get(entity_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if `entity_type` has at least one scope.
    pub fn is_scoped(&self, entity_type: &str) -> bool {
        self.scopes
            .read()
            .get(entity_type)
            .is_some_and(|s| !s.is_empty())
    }
}
