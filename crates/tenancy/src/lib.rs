//! Helios Tenancy
//!
//! This crate provides row-level multi-tenant scoping for a data-mapping
//! layer. Entity types that belong to a tenant see only the current tenant's
//! rows on read and get their tenant foreign key filled in on create, driven
//! by a per-execution-context "current tenant" slot.
//!
//! # Features
//!
//! - **Dimensions**: several independent tenancy axes (company, bookkeeper, ...)
//!   composing with AND
//! - **Scoped execution**: `with_tenant` sets a tenant for a block and always
//!   releases it, on success, error, panic or cancellation
//! - **Context isolation**: thread-local slots for OS threads and task-local
//!   scopes for tokio tasks
//! - **Read filtering**: evaluated per query, never cached
//! - **Auto-population**: foreign keys filled on create, never overwritten
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite reference backend with in-memory and file modes
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant identity, dimensions, context slots, registration and scoped execution
//! - [`scope`] - Read filters and pre-persist hooks tying entity types to tenants
//! - [`core`] - The contract a data-mapping layer offers (reflection, hooks, storage)
//! - [`types`] - Records and queries
//! - [`config`] - Configuration
//! - [`error`] - Error types
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # tokio_test::block_on(async {
//! use helios_tenancy::backends::sqlite::SqliteBackend;
//! use helios_tenancy::core::{ColumnType, ModelDefinition, RecordStorage};
//! use helios_tenancy::tenant::ScopedOptions;
//! use helios_tenancy::types::{Query, Record};
//! use helios_tenancy::Tenancy;
//!
//! let backend = SqliteBackend::in_memory().unwrap();
//! backend.define_model(ModelDefinition::new("Company").column("name", ColumnType::Text)).unwrap();
//! backend
//!     .define_model(
//!         ModelDefinition::new("User")
//!             .column("name", ColumnType::Text)
//!             .belongs_to("company", "Company"),
//!     )
//!     .unwrap();
//!
//! let tenancy = Tenancy::new();
//! let company_type = tenancy.register_scoped("Company", &ScopedOptions::new()).unwrap();
//! tenancy.belongs_to_tenant_on(&backend, "User", "company").unwrap();
//!
//! let foo = backend.create(Record::new("Company").with("name", "foo")).await.unwrap();
//! let foo_id = foo.tenant_id().unwrap();
//!
//! company_type
//!     .with_tenant_async(foo_id, async {
//!         // company_id is filled from the context
//!         let user = backend.create(Record::new("User").with("name", "alice")).await.unwrap();
//!         assert_eq!(user.get_i64("company_id"), Some(foo_id.value()));
//!     })
//!     .await;
//!
//! backend.create(Record::new("User").with("name", "bob")).await.unwrap();
//!
//! // Scoped: only foo's users
//! let visible = company_type
//!     .with_tenant_async(foo_id, backend.all(&Query::new("User")))
//!     .await
//!     .unwrap();
//! assert_eq!(visible.len(), 1);
//!
//! // No tenant set: every row
//! assert_eq!(backend.count(&Query::new("User")).await.unwrap(), 2);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod scope;
pub mod tenancy;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{NestedScope, TenancyConfig};
pub use error::{ConfigResult, ConfigurationError, StorageError, StorageResult, TenancyError};
pub use tenancy::Tenancy;
pub use tenant::{Dimension, DimensionRegistry, ScopedOptions, ScopedType, TenantContext, TenantId};

// Re-export core traits
pub use core::{DataMapper, HookRegistry, ModelReflection, RecordStorage};
pub use scope::{ScopeEnforcer, TenantScope};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
