//! Tests for tenant data isolation on a single dimension.
//!
//! Reads made while a tenant is current must return that tenant's rows only;
//! reads made with no tenant must return everything.

use helios_tenancy::core::RecordStorage;
use helios_tenancy::error::{StorageError, ValidationError};
use helios_tenancy::tenant::{ContextSnapshot, TenantContext};
use helios_tenancy::types::{Query, Record};
use helios_tenancy::{ConfigurationError, TenantId};

use crate::common::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Creates companies foo and bar with two users each, created while the
/// owning company is current. Returns (foo, bar).
async fn seed_foo_and_bar(fixture: &Fixture) -> (TenantId, TenantId) {
    let foo = fixture.create_tenant("Company", "foo").await;
    let bar = fixture.create_tenant("Company", "bar").await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    for (tenant, prefix) in [(foo, "foo"), (bar, "bar")] {
        company
            .with_tenant_async(tenant, async {
                fixture.create("User", &format!("{prefix}_user1")).await;
                fixture.create("User", &format!("{prefix}_user2")).await;
            })
            .await;
    }
    (foo, bar)
}

// ============================================================================
// Read Isolation Tests
// ============================================================================

/// Scoping to foo returns exactly foo's users, in creation order.
#[tokio::test]
async fn test_scoped_read_returns_only_current_tenant() {
    init_tracing();
    let fixture = company_users();
    let (foo, bar) = seed_foo_and_bar(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let foo_users = company
        .with_tenant_async(foo, fixture.backend.all(&Query::new("User")))
        .await
        .unwrap();
    assert_eq!(names(&foo_users), vec!["foo_user1", "foo_user2"]);

    let bar_users = company
        .with_tenant_async(bar, fixture.backend.all(&Query::new("User")))
        .await
        .unwrap();
    assert_eq!(names(&bar_users), vec!["bar_user1", "bar_user2"]);
}

/// With no tenant set, every row is visible.
#[tokio::test]
async fn test_empty_context_is_transparent() {
    let fixture = company_users();
    seed_foo_and_bar(&fixture).await;

    assert_eq!(fixture.tenancy.current_tenant("Company").unwrap(), None);
    let all = fixture.backend.all(&Query::new("User")).await.unwrap();
    assert_eq!(
        names(&all),
        vec!["foo_user1", "foo_user2", "bar_user1", "bar_user2"]
    );
}

/// A row owned by another tenant cannot be found by id.
#[tokio::test]
async fn test_find_hides_other_tenants() {
    let fixture = company_users();
    let (foo, bar) = seed_foo_and_bar(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let bar_user = fixture
        .backend
        .first(&Query::new("User").filter("company_id", bar))
        .await
        .unwrap()
        .unwrap();
    let bar_user_id = bar_user.id().unwrap();

    let from_foo = company
        .with_tenant_async(foo, fixture.backend.find("User", bar_user_id))
        .await
        .unwrap();
    assert!(from_foo.is_none());

    let from_bar = company
        .with_tenant_async(bar, fixture.backend.find("User", bar_user_id))
        .await
        .unwrap();
    assert_eq!(from_bar.unwrap().get_str("name"), Some("bar_user1"));
}

/// Counts and explicit filters go through the tenant filter too.
#[tokio::test]
async fn test_count_and_explicit_filters_are_scoped() {
    let fixture = company_users();
    let (foo, bar) = seed_foo_and_bar(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let count = company
        .with_tenant_async(foo, fixture.backend.count(&Query::new("User")))
        .await
        .unwrap();
    assert_eq!(count, 2);

    // Asking for bar's rows explicitly while foo is current yields nothing.
    let query = Query::new("User").filter("company_id", bar);
    let crossed = company
        .with_tenant_async(foo, fixture.backend.count(&query))
        .await
        .unwrap();
    assert_eq!(crossed, 0);
}

/// The same query object follows the context at the moment it runs.
#[tokio::test]
async fn test_filter_is_evaluated_per_query() {
    let fixture = company_users();
    let (foo, bar) = seed_foo_and_bar(&fixture).await;
    let query = Query::new("User");

    let (first, second, third) = TenantContext::scope(ContextSnapshot::empty(), async {
        fixture.tenancy.set_current_tenant("Company", Some(foo)).unwrap();
        let first = fixture.backend.all(&query).await.unwrap();

        fixture.tenancy.set_current_tenant("Company", Some(bar)).unwrap();
        let second = fixture.backend.all(&query).await.unwrap();

        fixture.tenancy.set_current_tenant("Company", None).unwrap();
        let third = fixture.backend.all(&query).await.unwrap();
        (first, second, third)
    })
    .await;

    assert_eq!(names(&first), vec!["foo_user1", "foo_user2"]);
    assert_eq!(names(&second), vec!["bar_user1", "bar_user2"]);
    assert_eq!(third.len(), 4);
}

/// A tenant with no rows sees nothing, even if it was never persisted.
#[tokio::test]
async fn test_unpersisted_tenant_sees_nothing() {
    let fixture = company_users();
    seed_foo_and_bar(&fixture).await;

    let ghost = TenantId::new(999);
    let visible = fixture
        .tenancy
        .with_tenant_async("Company", ghost, fixture.backend.all(&Query::new("User")))
        .await
        .unwrap()
        .unwrap();
    assert!(visible.is_empty());
}

// ============================================================================
// Auto-Population Tests
// ============================================================================

/// Records created under a tenant get its id as foreign key.
#[tokio::test]
async fn test_create_populates_foreign_key() {
    let fixture = company_users();
    let foo = fixture.create_tenant("Company", "foo").await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let user = company
        .with_tenant_async(foo, fixture.backend.create(Record::new("User").with("name", "alice")))
        .await
        .unwrap();

    assert_eq!(user.get_i64("company_id"), Some(foo.value()));
    let stored = fixture.backend.find("User", user.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.get_i64("company_id"), Some(foo.value()));
}

/// An explicitly set foreign key is kept even when it names another tenant.
#[tokio::test]
async fn test_create_never_overwrites_foreign_key() {
    let fixture = company_users();
    let foo = fixture.create_tenant("Company", "foo").await;
    let bar = fixture.create_tenant("Company", "bar").await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let record = Record::new("User").with("name", "alice").with("company_id", bar);
    let user = company
        .with_tenant_async(foo, fixture.backend.create(record))
        .await
        .unwrap();

    assert_eq!(user.get_i64("company_id"), Some(bar.value()));
}

/// Without a tenant, creation proceeds unscoped.
#[tokio::test]
async fn test_create_without_tenant_leaves_foreign_key_unset() {
    let fixture = company_users();
    let user = fixture.create("User", "drifter").await;
    assert!(!user.is_set("company_id"));
}

/// Updates never touch the foreign key, whatever tenant is current.
#[tokio::test]
async fn test_update_keeps_foreign_key() {
    let fixture = company_users();
    let foo = fixture.create_tenant("Company", "foo").await;
    let bar = fixture.create_tenant("Company", "bar").await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let mut user = company
        .with_tenant_async(foo, fixture.backend.create(Record::new("User").with("name", "alice")))
        .await
        .unwrap();
    user.set("name", "alice2");

    let updated = company
        .with_tenant_async(bar, fixture.backend.update(user))
        .await
        .unwrap();
    assert_eq!(updated.get_i64("company_id"), Some(foo.value()));
}

// ============================================================================
// Default Association Tests
// ============================================================================

/// `belongs_to_tenant` without an association uses `tenant`.
#[tokio::test]
async fn test_default_tenant_association() {
    let fixture = tenant_items();
    let acme = fixture.create_tenant("Tenant", "acme").await;
    let globex = fixture.create_tenant("Tenant", "globex").await;
    let tenant = fixture.tenancy.scoped("Tenant").unwrap();

    tenant
        .with_tenant_async(acme, fixture.create("Item", "anvil"))
        .await;
    tenant
        .with_tenant_async(globex, fixture.create("Item", "widget"))
        .await;

    let items = tenant
        .with_tenant_async(acme, fixture.backend.all(&Query::new("Item")))
        .await
        .unwrap();
    assert_eq!(names(&items), vec!["anvil"]);
    assert_eq!(items[0].get_i64("tenant_id"), Some(acme.value()));
}

/// Declaring a scope through an undeclared association fails at setup.
#[test]
fn test_missing_association_is_a_configuration_error() {
    let fixture = company_users();
    let err = fixture
        .tenancy
        .belongs_to_tenant(&fixture.backend, "User")
        .unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::AssociationNotFound {
            entity_type: "User".to_string(),
            association: "tenant".to_string(),
        }
    );
}

// ============================================================================
// Synchronous Scoped Execution
// ============================================================================

/// A blocking body sees the tenant through the thread slot.
#[test]
fn test_sync_with_tenant_scopes_reads() {
    let fixture = company_users();
    let (foo, _bar) = tokio_test::block_on(seed_foo_and_bar(&fixture));

    let users = fixture
        .tenancy
        .with_tenant("Company", foo, || {
            tokio_test::block_on(fixture.backend.all(&Query::new("User")))
        })
        .unwrap()
        .unwrap();

    assert_eq!(names(&users), vec!["foo_user1", "foo_user2"]);
    assert_eq!(fixture.tenancy.current_tenant("Company").unwrap(), None);
}

/// A failing body hands its error back and the tenant is still released.
#[test]
fn test_sync_with_tenant_restores_on_error() {
    let fixture = company_users();
    let foo = tokio_test::block_on(fixture.create_tenant("Company", "foo"));

    let result = fixture
        .tenancy
        .with_tenant("Company", foo, || {
            tokio_test::block_on(
                fixture
                    .backend
                    .create(Record::new("User").with("nickname", "al")),
            )
        })
        .unwrap();

    assert!(matches!(
        result,
        Err(StorageError::Validation(ValidationError::UnknownAttribute { .. }))
    ));
    assert_eq!(fixture.tenancy.current_tenant("Company").unwrap(), None);
}
