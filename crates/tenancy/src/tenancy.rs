//! The application-facing entry point.
//!
//! [`Tenancy`] bundles the dimension registry and scope enforcer behind the
//! calls application code makes by entity type name: `register_scoped`,
//! `belongs_to_tenant`, `current_tenant` and `with_tenant`. Build one at
//! startup, declare everything, then share it read-only.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::config::TenancyConfig;
use crate::core::DataMapper;
use crate::error::ConfigResult;
use crate::scope::{ScopeEnforcer, TenantScope};
use crate::tenant::{DimensionRegistry, ScopedOptions, ScopedType, TenantId};

/// Registration tables plus context access keyed by entity type.
///
/// # Examples
///
/// ```
/// use helios_tenancy::{Tenancy, TenantId};
/// use helios_tenancy::tenant::ScopedOptions;
///
/// let tenancy = Tenancy::new();
/// tenancy.register_scoped("Company", &ScopedOptions::new()).unwrap();
///
/// let seen = tenancy
///     .with_tenant("Company", TenantId::new(1), || tenancy.current_tenant("Company"))
///     .unwrap();
/// assert_eq!(seen.unwrap(), Some(TenantId::new(1)));
/// assert_eq!(tenancy.current_tenant("Company").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct Tenancy {
    config: TenancyConfig,
    registry: DimensionRegistry,
    enforcer: ScopeEnforcer,
}

impl Default for Tenancy {
    fn default() -> Self {
        Self::with_config(TenancyConfig::default())
    }
}

impl Tenancy {
    /// Creates a tenancy layer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tenancy layer with the given configuration.
    pub fn with_config(config: TenancyConfig) -> Self {
        Self {
            registry: DimensionRegistry::with_nested_scope(config.nested_scope),
            enforcer: ScopeEnforcer::new(),
            config,
        }
    }

    /// Marks `entity_type` as a tenant-owning type.
    pub fn register_scoped(&self, entity_type: &str, options: &ScopedOptions) -> ConfigResult<ScopedType> {
        self.registry.register(entity_type, options)
    }

    /// Like [`register_scoped`](Self::register_scoped) with options given as
    /// an untyped map, e.g. loaded from a configuration file.
    pub fn register_scoped_with(&self, entity_type: &str, options: &Value) -> ConfigResult<ScopedType> {
        let options = ScopedOptions::from_value(options)?;
        self.registry.register(entity_type, &options)
    }

    /// Scopes `entity_type` through the default association
    /// (`tenant` unless configured otherwise).
    pub fn belongs_to_tenant<M>(&self, mapper: &M, entity_type: &str) -> ConfigResult<Arc<TenantScope>>
    where
        M: DataMapper + ?Sized,
    {
        self.belongs_to_tenant_on(mapper, entity_type, &self.config.default_association)
    }

    /// Scopes `entity_type` through the named association.
    pub fn belongs_to_tenant_on<M>(
        &self,
        mapper: &M,
        entity_type: &str,
        association: &str,
    ) -> ConfigResult<Arc<TenantScope>>
    where
        M: DataMapper + ?Sized,
    {
        self.enforcer
            .belongs_to_tenant(&self.registry, mapper, entity_type, association)
    }

    /// Returns the registration handle of `entity_type`.
    pub fn scoped(&self, entity_type: &str) -> ConfigResult<ScopedType> {
        self.registry.lookup(entity_type)
    }

    /// Returns the current tenant of `entity_type`'s dimension.
    pub fn current_tenant(&self, entity_type: &str) -> ConfigResult<Option<TenantId>> {
        self.registry.current_tenant(entity_type)
    }

    /// Sets (or with `None`, clears) the current tenant of `entity_type`'s
    /// dimension.
    ///
    /// On an async runtime this fails with
    /// [`ConfigurationError::UnscopedTask`](crate::error::ConfigurationError::UnscopedTask)
    /// unless the caller runs inside a task scope, such as a task started
    /// with [`TenantContext::spawn`](crate::tenant::TenantContext::spawn).
    pub fn set_current_tenant(&self, entity_type: &str, tenant: Option<TenantId>) -> ConfigResult<()> {
        self.registry.set_current_tenant(entity_type, tenant)
    }

    /// Runs `body` with `entity_type`'s tenant set; see
    /// [`ScopedType::with_tenant`].
    ///
    /// Fails before running `body` if `entity_type` is not registered. The
    /// body's own result is returned inside `Ok` unchanged.
    pub fn with_tenant<R>(
        &self,
        entity_type: &str,
        tenant: impl Into<TenantId>,
        body: impl FnOnce() -> R,
    ) -> ConfigResult<R> {
        let scoped = self.registry.lookup(entity_type)?;
        Ok(scoped.with_tenant(tenant, body))
    }

    /// Async form of [`with_tenant`](Self::with_tenant); see
    /// [`ScopedType::with_tenant_async`].
    pub async fn with_tenant_async<F: Future>(
        &self,
        entity_type: &str,
        tenant: impl Into<TenantId>,
        body: F,
    ) -> ConfigResult<F::Output> {
        let scoped = self.registry.lookup(entity_type)?;
        Ok(scoped.with_tenant_async(tenant, body).await)
    }

    /// Returns the dimension registry.
    pub fn registry(&self) -> &DimensionRegistry {
        &self.registry
    }

    /// Returns the scope enforcer.
    pub fn enforcer(&self) -> &ScopeEnforcer {
        &self.enforcer
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }
}
