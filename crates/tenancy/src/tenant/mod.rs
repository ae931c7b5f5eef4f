//! Tenant context propagation.
//!
//! This module holds the parts of the scoping layer that know nothing about
//! queries or records: who the current tenant is, per dimension, in the
//! calling execution context.
//!
//! # Core Types
//!
//! - [`TenantId`] - Identity of a tenant record
//! - [`Dimension`] - Independent axis of tenancy, the key into the context
//! - [`TenantContext`] - Per-thread / per-task slots holding the current tenants
//! - [`DimensionRegistry`] - Table binding tenant-owning types to dimensions
//! - [`ScopedType`] - Handle for one registered type; entry point of `with_tenant`
//!
//! # Examples
//!
//! ```
//! use helios_tenancy::tenant::{DimensionRegistry, ScopedOptions, TenantId};
//!
//! let registry = DimensionRegistry::new();
//! let company = registry.register("Company", &ScopedOptions::new()).unwrap();
//! let bookkeeper = registry
//!     .register("Bookkeeper", &ScopedOptions::new().with_dimension_key("keeper"))
//!     .unwrap();
//!
//! company.with_tenant(TenantId::new(1), || {
//!     bookkeeper.with_tenant(TenantId::new(2), || {
//!         assert_eq!(company.current_tenant(), Some(TenantId::new(1)));
//!         assert_eq!(bookkeeper.current_tenant(), Some(TenantId::new(2)));
//!     });
//! });
//!
//! assert_eq!(company.current_tenant(), None);
//! ```

mod context;
pub(crate) mod dimension;
mod id;
mod registry;
mod scoped;

pub use context::{ContextSnapshot, TenantContext};
pub use dimension::Dimension;
pub use id::TenantId;
pub use registry::{DimensionRegistry, ScopedOptions, ScopedType};
