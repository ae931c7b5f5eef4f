//! Model fixtures.
//!
//! Each fixture builds a fresh in-memory backend plus a [`Tenancy`] with the
//! tenant-owning types registered and the scoped types declared:
//!
//! - [`company_users`]: `User belongs_to company`
//! - [`tenant_items`]: `Item belongs_to tenant` (the default association)
//! - [`company_bookkeeper_books`]: `Book` scoped on both `company` and
//!   `bookkeeper`

use helios_tenancy::backends::sqlite::SqliteBackend;
use helios_tenancy::core::{ColumnType, ModelDefinition, RecordStorage};
use helios_tenancy::tenant::ScopedOptions;
use helios_tenancy::types::Record;
use helios_tenancy::{Tenancy, TenancyConfig, TenantId};

/// A backend with models defined and a tenancy layer attached.
pub struct Fixture {
    /// The data layer.
    pub backend: SqliteBackend,
    /// The scoping layer.
    pub tenancy: Tenancy,
}

impl Fixture {
    /// Inserts a record of `entity_type` named `name`.
    pub async fn create(&self, entity_type: &str, name: &str) -> Record {
        self.backend
            .create(Record::new(entity_type).with("name", name))
            .await
            .expect("Failed to create record")
    }

    /// Inserts a tenant-owning record and returns its identity.
    pub async fn create_tenant(&self, entity_type: &str, name: &str) -> TenantId {
        self.create(entity_type, name)
            .await
            .tenant_id()
            .expect("Persisted record has an id")
    }
}

fn named(name: &str) -> ModelDefinition {
    ModelDefinition::new(name).column("name", ColumnType::Text)
}

fn backend() -> SqliteBackend {
    SqliteBackend::in_memory().expect("Failed to create SQLite backend")
}

/// `Company` owns the `company` dimension; `User belongs_to company`.
pub fn company_users() -> Fixture {
    company_users_with(TenancyConfig::default())
}

/// Like [`company_users`] with a custom configuration.
pub fn company_users_with(config: TenancyConfig) -> Fixture {
    let backend = backend();
    backend.define_model(named("Company")).unwrap();
    backend
        .define_model(named("User").belongs_to("company", "Company"))
        .unwrap();

    let tenancy = Tenancy::with_config(config);
    tenancy
        .register_scoped("Company", &ScopedOptions::new())
        .unwrap();
    tenancy
        .belongs_to_tenant_on(&backend, "User", "company")
        .unwrap();

    Fixture { backend, tenancy }
}

/// `Tenant` owns the `tenant` dimension; `Item belongs_to tenant`.
pub fn tenant_items() -> Fixture {
    let backend = backend();
    backend.define_model(named("Tenant")).unwrap();
    backend
        .define_model(named("Item").belongs_to("tenant", "Tenant"))
        .unwrap();

    let tenancy = Tenancy::new();
    tenancy
        .register_scoped("Tenant", &ScopedOptions::new())
        .unwrap();
    tenancy.belongs_to_tenant(&backend, "Item").unwrap();

    Fixture { backend, tenancy }
}

/// `Company` and `Bookkeeper` own independent dimensions; `Book` belongs to
/// both.
pub fn company_bookkeeper_books() -> Fixture {
    let backend = backend();
    backend.define_model(named("Company")).unwrap();
    backend.define_model(named("Bookkeeper")).unwrap();
    backend
        .define_model(
            named("Book")
                .belongs_to("company", "Company")
                .belongs_to("bookkeeper", "Bookkeeper"),
        )
        .unwrap();

    let tenancy = Tenancy::new();
    tenancy
        .register_scoped("Company", &ScopedOptions::new())
        .unwrap();
    tenancy
        .register_scoped("Bookkeeper", &ScopedOptions::new())
        .unwrap();
    tenancy
        .belongs_to_tenant_on(&backend, "Book", "company")
        .unwrap();
    tenancy
        .belongs_to_tenant_on(&backend, "Book", "bookkeeper")
        .unwrap();

    Fixture { backend, tenancy }
}

/// Returns the `name` attribute of each record, in order.
pub fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get_str("name").unwrap_or_default().to_string())
        .collect()
}
