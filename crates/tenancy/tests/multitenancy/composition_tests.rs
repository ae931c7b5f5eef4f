//! Tests for composing several tenancy dimensions.
//!
//! Books belong to a company and to a bookkeeper. Each dimension filters
//! independently and active filters combine with AND.

use helios_tenancy::core::RecordStorage;
use helios_tenancy::tenant::ScopedOptions;
use helios_tenancy::types::{Query, Record};
use helios_tenancy::{NestedScope, TenancyConfig, TenantId};

use crate::common::*;

// ============================================================================
// Helper Functions
// ============================================================================

struct Library {
    foo: TenantId,
    bar: TenantId,
    pedro: TenantId,
    maria: TenantId,
}

/// Four books covering every (company, bookkeeper) pair:
///
/// | book  | company | bookkeeper |
/// |-------|---------|------------|
/// | book  | foo     | pedro      |
/// | book2 | bar     | maria      |
/// | book3 | foo     | maria      |
/// | book4 | bar     | pedro      |
async fn seed_library(fixture: &Fixture) -> Library {
    let library = Library {
        foo: fixture.create_tenant("Company", "foo").await,
        bar: fixture.create_tenant("Company", "bar").await,
        pedro: fixture.create_tenant("Bookkeeper", "pedro").await,
        maria: fixture.create_tenant("Bookkeeper", "maria").await,
    };

    let books = [
        ("book", library.foo, library.pedro),
        ("book2", library.bar, library.maria),
        ("book3", library.foo, library.maria),
        ("book4", library.bar, library.pedro),
    ];
    for (name, company, bookkeeper) in books {
        fixture
            .backend
            .create(
                Record::new("Book")
                    .with("name", name)
                    .with("company_id", company)
                    .with("bookkeeper_id", bookkeeper),
            )
            .await
            .unwrap();
    }
    library
}

// ============================================================================
// Composition Tests
// ============================================================================

/// Both dimensions set: only the book matching both is visible.
#[tokio::test]
async fn test_both_dimensions_intersect() {
    init_tracing();
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();
    let bookkeeper = fixture.tenancy.scoped("Bookkeeper").unwrap();

    let books = company
        .with_tenant_async(
            library.foo,
            bookkeeper.with_tenant_async(library.maria, fixture.backend.all(&Query::new("Book"))),
        )
        .await
        .unwrap();

    assert_eq!(names(&books), vec!["book3"]);
}

/// Only the company set: the bookkeeper imposes nothing.
#[tokio::test]
async fn test_company_only() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let books = company
        .with_tenant_async(library.foo, fixture.backend.all(&Query::new("Book")))
        .await
        .unwrap();

    assert_eq!(names(&books), vec!["book", "book3"]);
}

/// Only the bookkeeper set: the company imposes nothing.
#[tokio::test]
async fn test_bookkeeper_only() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let bookkeeper = fixture.tenancy.scoped("Bookkeeper").unwrap();

    let books = bookkeeper
        .with_tenant_async(library.maria, fixture.backend.all(&Query::new("Book")))
        .await
        .unwrap();

    assert_eq!(names(&books), vec!["book2", "book3"]);
}

/// Neither set: every book.
#[tokio::test]
async fn test_no_dimension() {
    let fixture = company_bookkeeper_books();
    seed_library(&fixture).await;

    let count = fixture.backend.count(&Query::new("Book")).await.unwrap();
    assert_eq!(count, 4);
}

/// Leaving the inner block drops its filter but keeps the outer one.
#[tokio::test]
async fn test_inner_dimension_released_on_exit() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();
    let bookkeeper = fixture.tenancy.scoped("Bookkeeper").unwrap();

    let (inner, outer) = company
        .with_tenant_async(library.bar, async {
            let inner = bookkeeper
                .with_tenant_async(library.pedro, fixture.backend.all(&Query::new("Book")))
                .await
                .unwrap();
            let outer = fixture.backend.all(&Query::new("Book")).await.unwrap();
            (inner, outer)
        })
        .await;

    assert_eq!(names(&inner), vec!["book4"]);
    assert_eq!(names(&outer), vec!["book2", "book4"]);
}

/// Creating under both tenants fills both foreign keys.
#[tokio::test]
async fn test_create_populates_every_dimension() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();
    let bookkeeper = fixture.tenancy.scoped("Bookkeeper").unwrap();

    let book = company
        .with_tenant_async(
            library.foo,
            bookkeeper.with_tenant_async(library.pedro, fixture.create("Book", "book5")),
        )
        .await;

    assert_eq!(book.get_i64("company_id"), Some(library.foo.value()));
    assert_eq!(book.get_i64("bookkeeper_id"), Some(library.pedro.value()));
}

/// Only the dimension that is set gets populated.
#[tokio::test]
async fn test_create_populates_only_set_dimension() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let bookkeeper = fixture.tenancy.scoped("Bookkeeper").unwrap();

    let book = bookkeeper
        .with_tenant_async(library.maria, fixture.create("Book", "book5"))
        .await;

    assert!(!book.is_set("company_id"));
    assert_eq!(book.get_i64("bookkeeper_id"), Some(library.maria.value()));
}

// ============================================================================
// Dimension Configuration Tests
// ============================================================================

/// Nesting the same dimension restores the outer tenant by default.
#[tokio::test]
async fn test_nested_same_dimension_restores_outer_tenant() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;
    let company = fixture.tenancy.scoped("Company").unwrap();

    let after_inner = company
        .with_tenant_async(library.foo, async {
            company
                .with_tenant_async(library.bar, fixture.backend.count(&Query::new("Book")))
                .await
                .unwrap();
            fixture.backend.all(&Query::new("Book")).await.unwrap()
        })
        .await;

    assert_eq!(names(&after_inner), vec!["book", "book3"]);
}

/// With `NestedScope::Clear` the inner block empties the slot on exit.
#[test]
fn test_nested_same_dimension_clear() {
    let fixture = company_users_with(TenancyConfig::new().with_nested_scope(NestedScope::Clear));
    let company = fixture.tenancy.scoped("Company").unwrap();

    company.with_tenant(TenantId::new(1), || {
        company.with_tenant(TenantId::new(2), || {});
        assert_eq!(company.current_tenant(), None);
    });
}

/// An explicit dimension key replaces the derived one and still scopes.
#[tokio::test]
async fn test_explicit_dimension_key() {
    let fixture = company_bookkeeper_books();
    let library = seed_library(&fixture).await;

    let tenancy = helios_tenancy::Tenancy::new();
    let org = tenancy
        .register_scoped("Company", &ScopedOptions::new().with_dimension_key("org"))
        .unwrap();
    assert_eq!(org.dimension().as_str(), "org");

    // The fixture's own registration keeps its derived key.
    let company = fixture.tenancy.scoped("Company").unwrap();
    assert_eq!(company.dimension().as_str(), "company");

    // Setting "org" does not leak into the "company" slot.
    let visible = org
        .with_tenant_async(library.foo, fixture.backend.count(&Query::new("Book")))
        .await
        .unwrap();
    assert_eq!(visible, 4);
}
